//! HTTP API caller implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tracing::{debug, trace};

use rtmbot_core::{ApiCaller, ApiError, ApiResult, Params};

/// Base URL of the public Web API.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Request timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls remote methods over HTTP.
///
/// Each call is a form-encoded `POST {base_url}/{method}` carrying the
/// parameters plus the bot token.
#[derive(Clone)]
pub struct HttpApiCaller {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpApiCaller {
    /// Creates a caller for the public API.
    pub fn new(token: impl Into<String>) -> ApiResult<Self> {
        Self::with_options(token, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a caller with a custom base URL and timeout.
    pub fn with_options(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// The base URL methods are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}

impl std::fmt::Debug for HttpApiCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiCaller")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ApiCaller for HttpApiCaller {
    async fn call(&self, method: &str, mut params: Params) -> ApiResult<Value> {
        let url = self.method_url(method);
        debug!(method = %method, url = %url, "Calling API method");

        params.insert("token".to_string(), self.token.clone());

        let resp = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        trace!(method = %method, "API call returned");
        Ok(payload)
    }
}
