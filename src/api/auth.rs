//! Bearer-token bookkeeping and refresh grants.
//!
//! The client holds an [`AuthTokens`] set. When the API rejects a request
//! with 401, `refresh_access_token` exchanges the stored refresh token at the
//! token endpoint and the request is retried once with the new access token.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClientError, Result};

/// Seconds before expiry at which a token counts as expiring soon.
pub const REFRESH_BUFFER_SECS: i64 = 300; // 5 minutes

/// A stored set of OAuth tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Bearer token attached to every API request.
    pub access_token: String,
    /// Token used to obtain a new access token. Absent for short-lived
    /// sessions that cannot be refreshed.
    pub refresh_token: Option<String>,
    /// Unix timestamp when the access token expires, if known.
    pub expires_at: Option<i64>,
    /// Unix timestamp when this set was obtained.
    pub obtained_at: i64,
}

impl AuthTokens {
    /// Build a token set obtained now.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: None,
            obtained_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether the access token is already past its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_within(0)
    }

    /// Whether the access token expires within `buffer_secs` from now.
    /// Tokens without a known expiry never report as expiring.
    pub fn expires_within(&self, buffer_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now().timestamp() + buffer_secs >= expires_at,
            None => false,
        }
    }

    /// Merge a refresh response into this set: the new access token always
    /// wins, the old refresh token is kept when the server did not rotate it.
    pub fn merged_with(&self, refreshed: AuthTokens) -> AuthTokens {
        AuthTokens {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or_else(|| self.refresh_token.clone()),
            expires_at: refreshed.expires_at,
            obtained_at: refreshed.obtained_at,
        }
    }
}

/// Shape of a token endpoint response to a refresh grant.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Perform a `refresh_token` grant against the token endpoint.
pub(crate) async fn refresh_access_token(
    http: &reqwest::Client,
    token_url: &str,
    refresh_token: &str,
) -> Result<AuthTokens> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];

    let response = http
        .post(token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| ClientError::Auth(format!("Token refresh request failed: {}", e)))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        let snippet = body.chars().take(300).collect::<String>();
        return Err(ClientError::Auth(format!(
            "Token refresh failed (HTTP {}): {}",
            status.as_u16(),
            snippet
        )));
    }

    let parsed: RefreshResponse = serde_json::from_str(&body)
        .map_err(|e| ClientError::Auth(format!("Failed to parse refresh response: {}", e)))?;

    let now = chrono::Utc::now().timestamp();
    info!("Access token refreshed");

    Ok(AuthTokens {
        access_token: parsed.access_token,
        refresh_token: parsed.refresh_token,
        expires_at: parsed.expires_in.map(|secs| now + secs),
        obtained_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let tokens = AuthTokens::new("tok", None);
        assert!(!tokens.is_expired());
        assert!(!tokens.expires_within(REFRESH_BUFFER_SECS));
    }

    #[test]
    fn test_expires_within_buffer() {
        let now = chrono::Utc::now().timestamp();
        let mut tokens = AuthTokens::new("tok", None);
        tokens.expires_at = Some(now + 60);
        assert!(!tokens.is_expired());
        assert!(tokens.expires_within(REFRESH_BUFFER_SECS));
    }

    #[test]
    fn test_expired_token() {
        let now = chrono::Utc::now().timestamp();
        let mut tokens = AuthTokens::new("tok", None);
        tokens.expires_at = Some(now - 10);
        assert!(tokens.is_expired());
    }

    #[test]
    fn test_merge_keeps_old_refresh_token_when_not_rotated() {
        let old = AuthTokens::new("old-access", Some("old-refresh".to_string()));
        let refreshed = AuthTokens::new("new-access", None);
        let merged = old.merged_with(refreshed);
        assert_eq!(merged.access_token, "new-access");
        assert_eq!(merged.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[test]
    fn test_merge_prefers_rotated_refresh_token() {
        let old = AuthTokens::new("old-access", Some("old-refresh".to_string()));
        let refreshed = AuthTokens::new("new-access", Some("new-refresh".to_string()));
        let merged = old.merged_with(refreshed);
        assert_eq!(merged.refresh_token.as_deref(), Some("new-refresh"));
    }
}
