use crate::error::RelayError;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Response, header};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

/// Protocol-blind range passthrough from an origin URL to the client.
#[derive(Clone)]
pub struct StreamRelay {
    client: reqwest::Client,
    /// `None` when the number of concurrent streams is unbounded
    permits: Option<Arc<Semaphore>>,
    max_streams: usize,
}

impl StreamRelay {
    pub fn new(max_streams: usize, connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .no_proxy()
            .build()?;

        Ok(Self::with_client(client, max_streams))
    }

    pub fn with_client(client: reqwest::Client, max_streams: usize) -> Self {
        let permits = (max_streams > 0).then(|| Arc::new(Semaphore::new(max_streams)));
        Self {
            client,
            permits,
            max_streams,
        }
    }

    /// Try to take a stream slot without waiting.
    pub fn try_acquire(&self) -> Result<Option<OwnedSemaphorePermit>, RelayError> {
        let Some(permits) = &self.permits else {
            return Ok(None);
        };

        permits.clone().try_acquire_owned().map(Some).map_err(|_| {
            warn!(max_streams = self.max_streams, "Max concurrent streams exceeded");
            RelayError::Saturated
        })
    }

    /// Fetch `origin_url` once, forwarding `range` verbatim, and stream the
    /// upstream body back without buffering it.
    ///
    /// The stream slot and the upstream connection are released when the
    /// returned body is dropped, including on client disconnect.
    pub async fn relay(
        &self,
        origin_url: &str,
        range: Option<&HeaderValue>,
    ) -> Result<Response<Body>, RelayError> {
        let permit = self.try_acquire()?;

        let mut request = self.client.get(origin_url);
        if let Some(range) = range {
            request = request.header(header::RANGE, range.clone());
        }

        debug!(?range, "Contacting origin");
        let upstream = request.send().await.map_err(|error| {
            error!(%error, "Failed to reach origin");
            RelayError::OriginUnreachable
        })?;

        let status = upstream.status();
        if !status.is_success() {
            warn!(%status, "Origin returned non-success status");
            return Err(RelayError::Upstream(status));
        }

        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );

        info!(%status, content_length = ?upstream.content_length(), "Relaying origin response");

        let stream = upstream
            .bytes_stream()
            .map(move |chunk| {
                let _slot = &permit;
                chunk
            })
            .inspect_err(|error| error!(%error, "Origin stream failed"));

        let mut res = Response::new(Body::from_stream(stream));
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        Ok(res)
    }
}

/// Drop headers that describe the upstream connection rather than the payload.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in [
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
    ] {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
