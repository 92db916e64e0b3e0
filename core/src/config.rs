//! Service location for the request client.
//!
//! The base URL is read once and handed to `ApiClient::new`; nothing reads it
//! from global state afterwards.

use std::env;

use crate::error::ApiError;

/// Environment variable holding the service base URL.
pub const BASE_URL_VAR: &str = "API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// Validate `base_url` and strip trailing slashes.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Config(format!("{BASE_URL_VAR} is empty")));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base url must start with http:// or https://, got {base_url}"
            )));
        }
        Ok(Self {
            base_url: base_url.to_string(),
        })
    }

    /// Read `API_URL` from the environment, loading a `.env` file first if
    /// one exists.
    pub fn from_env() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();
        let base_url = env::var(BASE_URL_VAR)
            .map_err(|_| ApiError::Config(format!("{BASE_URL_VAR} is not set")))?;
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL with a relative endpoint such as `/courses`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }
}
