use crate::access::{AccessController, Secret};
use crate::config::Config;
use crate::registry::LinkRegistry;
use crate::relay::StreamRelay;
use crate::store::{KvStore, open_store};
use anyhow::anyhow;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub registry: LinkRegistry,
    pub access: AccessController,
    pub relay: StreamRelay,
    pub public_base_url: Option<Arc<str>>,
}

impl AppState {
    /// Build the state from a validated configuration.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store = open_store(&config.to_storage_backend()).await?;
        Self::with_store(config, store)
    }

    /// Build the state around an already opened store.
    pub fn with_store(config: &Config, store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let user = config
            .secret_token
            .clone()
            .ok_or_else(|| anyhow!("Secret token is not configured"))?;
        let admin = config
            .admin_token
            .clone()
            .ok_or_else(|| anyhow!("Admin token is not configured"))?;

        let relay = StreamRelay::new(config.max_streams, config.origin_connect_timeout())?;
        info!(max_streams = config.max_streams, "Stream relay ready");

        Ok(Self {
            registry: LinkRegistry::new(store),
            access: AccessController::new(Secret::new(user), Secret::new(admin)),
            relay,
            public_base_url: config
                .public_base_url
                .as_deref()
                .map(|base| Arc::from(base.trim_end_matches('/'))),
        })
    }
}
