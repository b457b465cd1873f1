use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{error, warn};

/// Log every response the relay answers with a 4xx or 5xx status.
///
/// Only the path is recorded; `/play` and `/stream` carry secrets in the query.
pub async fn log_request_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    let status = response.status();
    match status.as_u16() {
        400..=499 => warn!(%method, %path, %status, "Request rejected"),
        500..=599 => error!(%method, %path, %status, "Request failed"),
        _ => {}
    }

    response
}
