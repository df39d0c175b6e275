//! Client configuration.
//!
//! `ClientConfig` covers the REST endpoints and HTTP behavior; the nested
//! `CacheConfig` controls the response cache. Both deserialize from config
//! files with `#[serde(default)]` so partial configs stay valid, and
//! `ClientConfig::from_env()` applies `LEADBRIDGE_*` environment overrides
//! (after a best-effort `.env` load).

use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://api.leadbridge.io/v1";
const DEFAULT_TOKEN_URL: &str = "https://api.leadbridge.io/oauth/token";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

/// Top-level configuration for [`crate::api::ApiClient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the LeadBridge REST API.
    pub base_url: String,
    /// Token endpoint used for refresh grants.
    pub token_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Response cache settings.
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config from defaults plus `LEADBRIDGE_*` environment variables.
    ///
    /// Loads a `.env` file first if one exists. Unparsable numeric values are
    /// logged and ignored rather than failing startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(url) = std::env::var("LEADBRIDGE_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(url) = std::env::var("LEADBRIDGE_TOKEN_URL") {
            config.token_url = url;
        }
        if let Some(secs) = env_u64("LEADBRIDGE_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Some(secs) = env_u64("LEADBRIDGE_CACHE_TTL_SECS") {
            config.cache.ttl_secs = secs;
        }
        if let Ok(raw) = std::env::var("LEADBRIDGE_CACHE_ENABLED") {
            config.cache.enabled = matches!(raw.trim(), "1" | "true" | "yes");
        }
        config
    }
}

/// Settings for the response cache layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, every fetch goes straight to the network.
    pub enabled: bool,
    /// Default TTL for cached responses, in seconds. Callers can override
    /// per request via `FetchOptions`.
    pub ttl_secs: u64,
    /// Upper bound on cached entries. Expired entries are evicted first,
    /// then the oldest by creation time.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparsable numeric env override");
            None
        }
    }
}
