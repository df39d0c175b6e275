//! HTTP client for the LeadBridge REST API.
//!
//! Wraps `reqwest` with bearer-token auth and a retry-once-on-401 wrapper:
//! a token expiring within the refresh buffer is refreshed proactively
//! before sending; a rejected request triggers one refresh grant, the
//! request is replayed with the new token, and a second rejection is
//! surfaced as an auth error. No other retry policy lives here.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

use super::auth::{self, AuthTokens};
use super::transport::ApiTransport;

/// Longest error-body snippet carried in an [`ClientError::Api`].
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Authenticated client for the LeadBridge API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    tokens: Mutex<AuthTokens>,
}

impl ApiClient {
    /// Build a client from config and an initial token set.
    pub fn new(config: &ClientConfig, tokens: AuthTokens) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            tokens: Mutex::new(tokens),
        })
    }

    /// Snapshot of the current token set.
    pub async fn tokens(&self) -> AuthTokens {
        self.tokens.lock().await.clone()
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = build_url(&self.base_url, path);
        let token = self.current_token().await?;

        let response = self.execute(method.clone(), &url, query, body, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return parse_response(&url, response).await;
        }

        debug!(url = %url, "Request rejected with 401, refreshing access token");
        let token = self.refresh_tokens(&token).await?;
        let response = self.execute(method, &url, query, body, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Auth(
                "Request rejected again after token refresh".to_string(),
            ));
        }
        parse_response(&url, response).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("Request to '{}' failed: {}", url, e)))
    }

    /// Return an access token for the next request, refreshing proactively
    /// when the stored one expires within the refresh buffer.
    ///
    /// A failed proactive refresh falls back to the existing token while it
    /// is still valid; the reactive 401 path remains as the backstop.
    async fn current_token(&self) -> Result<String> {
        let (access_token, needs_refresh) = {
            let tokens = self.tokens.lock().await;
            let expiring = tokens.expires_within(auth::REFRESH_BUFFER_SECS)
                && tokens.refresh_token.is_some();
            (tokens.access_token.clone(), expiring)
        };
        if !needs_refresh {
            return Ok(access_token);
        }

        debug!("Access token expiring soon, refreshing proactively");
        match self.refresh_tokens(&access_token).await {
            Ok(token) => Ok(token),
            Err(err) => {
                let tokens = self.tokens.lock().await;
                if tokens.is_expired() {
                    Err(err)
                } else {
                    warn!(error = %err, "Proactive token refresh failed, using existing token");
                    Ok(tokens.access_token.clone())
                }
            }
        }
    }

    /// Refresh the stored tokens, unless another caller already did.
    async fn refresh_tokens(&self, rejected_token: &str) -> Result<String> {
        let mut tokens = self.tokens.lock().await;
        if tokens.access_token != rejected_token {
            return Ok(tokens.access_token.clone());
        }
        let refresh = tokens.refresh_token.clone().ok_or_else(|| {
            ClientError::Auth("Access token rejected and no refresh token is available".to_string())
        })?;
        let refreshed = auth::refresh_access_token(&self.http, &self.token_url, &refresh).await?;
        let merged = tokens.merged_with(refreshed);
        *tokens = merged;
        Ok(tokens.access_token.clone())
    }
}

#[async_trait]
impl ApiTransport for ApiClient {
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.request(Method::GET, path, query, None).await
    }

    async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.request(method, path, &[], body).await
    }
}

fn build_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url, path.trim_start_matches('/'))
}

async fn parse_response(url: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Http(format!("Failed reading response from '{}': {}", url, e)))?;

    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: truncate_body(&body),
        });
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| {
        ClientError::Serialization(format!("Failed to parse response from '{}': {}", url, e))
    })
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
