pub mod access;
pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod page;
pub mod registry;
pub mod relay;
pub mod slug;
pub mod store;

use anyhow::Context;
use axum::Router;
use axum::extract::Extension;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

//
// Re-export
//
pub use access::{AccessController, Secret};
pub use app_state::AppState;
pub use config::Config;
pub use error::RelayError;
pub use registry::{LinkEntry, LinkRegistry};
pub use relay::StreamRelay;
pub use store::{FileStore, KvStore, MemoryStore, StorageBackend, StoreError};

/// All HTTP routes wired to `state`.
pub fn router(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::index))
        .route("/generate", post(api::generate))
        .route("/play/{slug}", get(api::play))
        .route("/stream", get(api::direct_stream))
        .route("/stream/{slug}", get(api::stream))
        .route("/admin", get(api::admin))
        .route("/delete/{slug}", delete(api::delete))
        .layer(axum::middleware::from_fn(api::log_request_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let state = AppState::new(&config)
        .await
        .context("Failed to create app state")?;
    let app = router(state);

    let addr = format!("{}:{}", config.bind_address, config.listen_on_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Relay listening on {addr}");

    axum::serve(listener, app).await.context("Server error")
}
