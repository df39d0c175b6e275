//! Transport trait separating resource modules from HTTP.
//!
//! Resource modules talk to an `ApiTransport` instead of reqwest directly so
//! tests can swap in an in-memory mock and exercise caching and invalidation
//! without a network.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;

/// Async HTTP operations against the LeadBridge API.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// GET `path` with query parameters, returning the parsed JSON body.
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value>;

    /// Send a JSON (or empty) body with the given method, returning the
    /// parsed JSON response. `Value::Null` stands in for empty bodies.
    async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;
}
