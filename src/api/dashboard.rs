//! Dashboard metrics: an instant answer beats a current one.
//!
//! Metrics reads use stale-while-revalidate with a short TTL, so the
//! dashboard renders immediately from the last known numbers while a
//! background refresh catches the cache up.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{cache_key, FetchOptions, ResponseCache};
use crate::error::Result;

use super::transport::ApiTransport;

const METRICS_TTL: Duration = Duration::from_secs(15);

/// Aggregate lead-sync numbers shown on the dashboard.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DashboardMetrics {
    pub total_leads: u64,
    pub synced_leads: u64,
    pub failed_syncs: u64,
    pub conversion_rate: f64,
}

/// Dashboard reads against the API.
pub struct DashboardApi {
    transport: Arc<dyn ApiTransport>,
    cache: ResponseCache,
}

impl DashboardApi {
    pub fn new(transport: Arc<dyn ApiTransport>, cache: ResponseCache) -> Self {
        Self { transport, cache }
    }

    /// Fetch dashboard metrics, preferring a stale cached answer over a
    /// network round trip.
    pub async fn metrics(&self) -> Result<DashboardMetrics> {
        let key = cache_key("dashboard:metrics", &[]);
        let transport = Arc::clone(&self.transport);
        let value = self
            .cache
            .fetch_with_cache(
                &key,
                move || async move { transport.get_json("/dashboard/metrics", &[]).await },
                FetchOptions::default()
                    .with_ttl(METRICS_TTL)
                    .with_stale_while_revalidate(),
            )
            .await?;
        serde_json::from_value(value).map_err(Into::into)
    }
}
