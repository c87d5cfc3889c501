// # Linode API Gateway
//
// This crate implements the `ApiGateway` contract against the Linode API v4.
//
// ## Scope
//
// Authenticated request/response plumbing only. The gateway knows nothing
// about zones, records or reconciliation; it turns a relative path plus an
// optional JSON body into a decoded JSON reply or a typed failure:
//
// - connection / DNS / TLS / timeout problems → `Error::Transport`
// - a body that is not valid JSON → `Error::Decode`
// - 401/403 → `Error::Config` (bad credentials)
// - 404 → `Error::NotFound`
//
// No retry, no backoff, no caching: one HTTP call per invocation, errors
// propagate to the engine and the operator re-runs the tool.
//
// ## Security
//
// The API token is sent as a bearer header and never appears in logs or in
// the `Debug` output.
//
// ## API Reference
//
// - Linode API v4: https://www.linode.com/docs/api/domains/
// - List Domains: GET `/domains?page=N`
// - List Records: GET `/domains/{zoneId}/records?page=N`
// - Create Record: POST `/domains/{zoneId}/records`
// - Update Record: PUT `/domains/{zoneId}/records/{recordId}`

use async_trait::async_trait;
use dyndns_core::error::{Error, Result};
use dyndns_core::traits::ApiGateway;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Linode API base URL
const LINODE_API_BASE: &str = "https://api.linode.com/v4";

/// Timeout for every API request; expiry surfaces as a transport failure
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Bearer-authenticated JSON gateway to the Linode API v4
pub struct LinodeGateway {
    /// API token, sent as a bearer header. Never log this value.
    token: String,

    /// Base URL; overridable for tests against a local mock server
    base_url: String,

    /// HTTP client with the request timeout configured
    client: reqwest::Client,
}

// The Debug implementation intentionally does not expose the token.
impl std::fmt::Debug for LinodeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeGateway")
            .field("token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LinodeGateway {
    /// Create a gateway against the production Linode API
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, LINODE_API_BASE)
    }

    /// Create a gateway against an arbitrary base URL
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("Linode API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Perform one request and decode the reply
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "API request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("request failed for {path}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| Error::transport(format!("failed reading reply from {path}: {e}")))?;
            return serde_json::from_str(&text)
                .map_err(|e| Error::decode(format!("invalid JSON from {path}: {e}")));
        }

        let detail = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(Error::config(format!(
                "authentication failed ({status}) for {path}: check the API token and its permissions"
            ))),
            404 => Err(Error::not_found(format!("{path} ({status})"))),
            _ => Err(Error::transport(format!(
                "API error {status} for {path}: {detail}"
            ))),
        }
    }
}

#[async_trait]
impl ApiGateway for LinodeGateway {
    async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None).await
    }
}
