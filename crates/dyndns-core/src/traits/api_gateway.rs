// # API Gateway Trait
//
// Defines the interface for talking to the provider's REST API.
//
// ## Implementations
//
// - Linode API v4: `dyndns-provider-linode` crate
//
// ## Contract
//
// Four verbs over bearer-token authentication with JSON bodies. Paths are
// relative to the provider's API base (e.g. `/domains?page=2`). On HTTP
// success an implementation returns the decoded body; on connection, DNS,
// TLS or timeout failure it returns [`Error::Transport`]; a body that is
// not valid JSON returns [`Error::Decode`].
//
// The engine never retries a gateway failure: a failure aborts the current
// zone/record/family unit and is reported upward, and the operator re-runs
// the tool.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for provider API gateway implementations
///
/// Implementations must be thread-safe, stateless between requests, and
/// single-shot: one HTTP call per method invocation, no retry or backoff
/// (error policy is owned by the engine and the operator).
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Perform a GET request
    async fn get(&self, path: &str) -> Result<Value>;

    /// Perform a POST request with a JSON body
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    /// Perform a PUT request with a JSON body
    async fn put(&self, path: &str, body: &Value) -> Result<Value>;

    /// Perform a DELETE request
    async fn delete(&self, path: &str) -> Result<Value>;
}
