//! Lead resource: cached reads, invalidating writes.
//!
//! Reads go through the response cache under `leads:`-prefixed keys. Every
//! mutation invalidates `leads:*` afterward, which blankets all cached list
//! and pagination variants along with individual lead lookups.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{cache_key, FetchOptions, ResponseCache};
use crate::error::Result;

use super::transport::ApiTransport;

/// A captured lead and its CRM sync state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Where the lead came from (widget, import, API).
    #[serde(default)]
    pub source: Option<String>,
    /// Sync state in the connected CRM ("pending", "synced", "failed").
    #[serde(default)]
    pub crm_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One page of leads.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total: u64,
    pub page: u32,
}

/// Payload for creating a lead.
#[derive(Debug, Clone, Serialize)]
pub struct NewLead {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Partial update for a lead. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_status: Option<String>,
}

/// Lead operations against the API, read-through cached.
pub struct LeadsApi {
    transport: Arc<dyn ApiTransport>,
    cache: ResponseCache,
}

impl LeadsApi {
    pub fn new(transport: Arc<dyn ApiTransport>, cache: ResponseCache) -> Self {
        Self { transport, cache }
    }

    /// Fetch one page of leads, served from cache while fresh.
    pub async fn list(&self, page: u32, per_page: u32) -> Result<LeadPage> {
        let page_param = page.to_string();
        let per_page_param = per_page.to_string();
        let key = cache_key(
            "leads:list",
            &[("page", &page_param), ("per_page", &per_page_param)],
        );

        let transport = Arc::clone(&self.transport);
        let value = self
            .cache
            .fetch_with_cache(
                &key,
                move || async move {
                    transport
                        .get_json(
                            "/leads",
                            &[
                                ("page", page_param.as_str()),
                                ("per_page", per_page_param.as_str()),
                            ],
                        )
                        .await
                },
                FetchOptions::default(),
            )
            .await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Fetch a single lead by id, served from cache while fresh.
    pub async fn get(&self, id: &str) -> Result<Lead> {
        let key = cache_key("leads:get", &[("id", id)]);
        let path = format!("/leads/{}", id);

        let transport = Arc::clone(&self.transport);
        let value = self
            .cache
            .fetch_with_cache(
                &key,
                move || async move { transport.get_json(&path, &[]).await },
                FetchOptions::default(),
            )
            .await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Create a lead, then drop every cached `leads:` variant.
    pub async fn create(&self, new_lead: &NewLead) -> Result<Lead> {
        let body = serde_json::to_value(new_lead)?;
        let value = self
            .transport
            .send_json(Method::POST, "/leads", Some(&body))
            .await?;
        self.invalidate_after_write();
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Apply a partial update, then drop every cached `leads:` variant.
    pub async fn update(&self, id: &str, patch: &LeadPatch) -> Result<Lead> {
        let body = serde_json::to_value(patch)?;
        let path = format!("/leads/{}", id);
        let value = self
            .transport
            .send_json(Method::PATCH, &path, Some(&body))
            .await?;
        self.invalidate_after_write();
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Delete a lead, then drop every cached `leads:` variant.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("/leads/{}", id);
        self.transport
            .send_json(Method::DELETE, &path, None)
            .await?;
        self.invalidate_after_write();
        Ok(())
    }

    fn invalidate_after_write(&self) {
        debug!("lead mutation committed, invalidating cached lead reads");
        self.cache.invalidate(&["leads:*"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// In-memory transport recording every call, in the spirit of a mock
    /// fetcher: one canned response per direction.
    struct MockTransport {
        get_response: Value,
        send_response: Value,
        get_calls: Mutex<Vec<String>>,
        send_calls: Mutex<Vec<(Method, String)>>,
    }

    impl MockTransport {
        fn new(get_response: Value, send_response: Value) -> Arc<Self> {
            Arc::new(Self {
                get_response,
                send_response,
                get_calls: Mutex::new(Vec::new()),
                send_calls: Mutex::new(Vec::new()),
            })
        }

        fn get_count(&self) -> usize {
            self.get_calls.lock().unwrap().len()
        }

        fn send_calls(&self) -> Vec<(Method, String)> {
            self.send_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiTransport for MockTransport {
        async fn get_json(&self, path: &str, _query: &[(&str, &str)]) -> Result<Value> {
            self.get_calls.lock().unwrap().push(path.to_string());
            Ok(self.get_response.clone())
        }

        async fn send_json(
            &self,
            method: Method,
            path: &str,
            _body: Option<&Value>,
        ) -> Result<Value> {
            self.send_calls
                .lock()
                .unwrap()
                .push((method, path.to_string()));
            Ok(self.send_response.clone())
        }
    }

    fn lead_json(id: &str) -> Value {
        json!({
            "id": id,
            "email": format!("{}@example.com", id),
            "name": "Test Lead",
            "source": "widget",
            "crm_status": "pending",
            "created_at": "2026-08-01T12:00:00Z"
        })
    }

    fn page_json() -> Value {
        json!({ "leads": [lead_json("l1")], "total": 1, "page": 1 })
    }

    fn leads_api(transport: Arc<MockTransport>) -> LeadsApi {
        LeadsApi::new(transport, ResponseCache::new(CacheConfig::default()))
    }

    #[tokio::test]
    async fn test_list_is_cached() {
        let transport = MockTransport::new(page_json(), Value::Null);
        let api = leads_api(Arc::clone(&transport));

        let first = api.list(1, 50).await.unwrap();
        let second = api.list(1, 50).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.leads[0].email, "l1@example.com");
        assert_eq!(transport.get_count(), 1, "second read must come from cache");
    }

    #[tokio::test]
    async fn test_distinct_pages_fetch_separately() {
        let transport = MockTransport::new(page_json(), Value::Null);
        let api = leads_api(Arc::clone(&transport));

        api.list(1, 50).await.unwrap();
        api.list(2, 50).await.unwrap();
        assert_eq!(transport.get_count(), 2);
    }

    #[tokio::test]
    async fn test_get_lead_typed() {
        let transport = MockTransport::new(lead_json("l7"), Value::Null);
        let api = leads_api(Arc::clone(&transport));

        let lead = api.get("l7").await.unwrap();
        assert_eq!(lead.id, "l7");
        assert_eq!(lead.crm_status.as_deref(), Some("pending"));
        assert_eq!(
            transport.get_calls.lock().unwrap().as_slice(),
            &["/leads/l7".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_invalidates_cached_lists() {
        let transport = MockTransport::new(page_json(), lead_json("l2"));
        let api = leads_api(Arc::clone(&transport));

        api.list(1, 50).await.unwrap();
        assert_eq!(transport.get_count(), 1);

        let created = api
            .create(&NewLead {
                email: "l2@example.com".to_string(),
                name: None,
                source: Some("widget".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(created.id, "l2");
        assert_eq!(
            transport.send_calls(),
            vec![(Method::POST, "/leads".to_string())]
        );

        // The cached page was invalidated by the write
        api.list(1, 50).await.unwrap();
        assert_eq!(transport.get_count(), 2);
    }

    #[tokio::test]
    async fn test_update_invalidates_cached_lead() {
        let transport = MockTransport::new(lead_json("l7"), lead_json("l7"));
        let api = leads_api(Arc::clone(&transport));

        api.get("l7").await.unwrap();
        api.update(
            "l7",
            &LeadPatch {
                crm_status: Some("synced".to_string()),
                ..LeadPatch::default()
            },
        )
        .await
        .unwrap();

        api.get("l7").await.unwrap();
        assert_eq!(transport.get_count(), 2, "get after update must refetch");
    }

    #[tokio::test]
    async fn test_delete_invalidates_and_returns_unit() {
        let transport = MockTransport::new(page_json(), Value::Null);
        let api = leads_api(Arc::clone(&transport));

        api.list(1, 50).await.unwrap();
        api.delete("l1").await.unwrap();
        assert_eq!(
            transport.send_calls(),
            vec![(Method::DELETE, "/leads/l1".to_string())]
        );

        api.list(1, 50).await.unwrap();
        assert_eq!(transport.get_count(), 2);
    }

    #[test]
    fn test_lead_patch_skips_unset_fields() {
        let patch = LeadPatch {
            crm_status: Some("synced".to_string()),
            ..LeadPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, json!({"crm_status": "synced"}));
    }
}
