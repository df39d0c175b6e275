//! LeadBridge client library: cached REST access to the LeadBridge API.
//!
//! The centerpiece is [`ResponseCache`], a TTL response cache with in-flight
//! request de-duplication and stale-while-revalidate, sitting between
//! resource modules and the HTTP client:
//!
//! - concurrent reads for one key share a single network fetch;
//! - expired entries can be served immediately while a detached task
//!   refreshes them;
//! - mutations invalidate exact keys or `prefix*` patterns.
//!
//! [`api::ApiClient`] supplies the fetchers: bearer-token requests with one
//! automatic token refresh and retry on 401. Resource modules
//! ([`api::LeadsApi`], [`api::DashboardApi`]) wire reads through the cache
//! and writes through invalidation.
//!
//! ```no_run
//! use leadbridge::{FetchOptions, ResponseCache};
//! use serde_json::json;
//!
//! # async fn run() -> leadbridge::Result<()> {
//! let cache = ResponseCache::with_defaults();
//! let value = cache
//!     .fetch_with_cache(
//!         "leads:list?page=1",
//!         || async { Ok(json!({ "leads": [] })) },
//!         FetchOptions::default(),
//!     )
//!     .await?;
//! cache.invalidate(&["leads:*"]);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;

pub use api::{ApiClient, ApiTransport, AuthTokens, DashboardApi, LeadsApi};
pub use cache::{cache_key, CacheStats, FetchOptions, ResponseCache};
pub use config::{CacheConfig, ClientConfig};
pub use error::{ClientError, Result};
