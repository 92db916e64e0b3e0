//! Generic request client for the campus API.
//!
//! # Design
//! `ApiClient` holds the injected `ClientConfig` and a shared `Transport`,
//! and carries no mutable state between calls. A round trip is split into
//! `build_request` (endpoint + options to `HttpRequest`), the transport call,
//! and `parse_response` (`HttpResponse` to `T`). `request` composes the three;
//! the resource wrappers in `resources` are thin layers over it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};

const NO_CONTENT: u16 = 204;

/// Method, headers and body for one request. Defaults to a bare `GET`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn method(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// A request with a JSON body and `content-type: application/json`.
    pub fn json<B: Serialize + ?Sized>(method: HttpMethod, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        Ok(Self {
            method,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Async client for the campus API.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_request(&self, endpoint: &str, options: RequestOptions) -> HttpRequest {
        HttpRequest {
            method: options.method,
            url: self.config.url_for(endpoint),
            headers: options.headers,
            body: options.body,
        }
    }

    /// Interpret a response received for `endpoint`.
    ///
    /// Any non-2xx status fails, whatever the body holds. A 204 decodes JSON
    /// `null` into `T` without looking at the body, so `()` and `Option<_>`
    /// targets succeed. Everything else is parsed as JSON.
    pub fn parse_response<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: HttpResponse,
    ) -> Result<T, ApiError> {
        if !response.is_success() {
            let detail = if response.body.trim().is_empty() {
                response.status_line()
            } else {
                response.body
            };
            return Err(ApiError::Request {
                endpoint: endpoint.to_string(),
                status: response.status,
                detail,
            });
        }

        let decoded = if response.status == NO_CONTENT {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_str(&response.body)
        };
        decoded.map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// One round trip against `endpoint`, decoded as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.build_request(endpoint, options);
        debug!(method = %request.method, endpoint, "sending request");
        let response = self.transport.execute(request).await.map_err(ApiError::Network)?;
        self.parse_response(endpoint, response)
    }
}
