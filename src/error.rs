//! Crate-wide error type and `Result` alias.
//!
//! All variants carry pre-rendered strings so the error type stays `Clone`.
//! The cache layer hands one in-flight fetch to every concurrent caller, and
//! each of them must receive the failure if the fetch fails.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the LeadBridge client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Transport-level failure: connection refused, DNS, TLS, timeout.
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication failed and could not be recovered by a token refresh.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid or unusable client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A response body (or cached value) did not match the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 404,
            message: "lead not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 404): lead not found");
    }

    #[test]
    fn test_errors_are_cloneable() {
        // Coalesced callers each get a clone of the same fetch failure.
        let err = ClientError::Http("connection reset".to_string());
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ClientError = parse_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
