//! The network seam between `ApiClient` and the outside world.

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a plain-data request and returns the raw response.
///
/// Implementations must return non-2xx responses as `Ok`; `Err` is reserved
/// for failures where no response arrived at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a shared `reqwest::Client`. No timeout is set beyond
/// reqwest's own defaults.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(method = %request.method, url = %request.url, status = status.as_u16(), "response received");

        // A failed status already carries its meaning, so a broken body there
        // falls back to the status line. A broken 2xx body has no payload.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) if !status.is_success() => {
                debug!(url = %request.url, error = %err, "error body unreadable");
                String::new()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body,
        })
    }
}
