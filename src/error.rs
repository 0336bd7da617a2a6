//! Error types for cardcheck-core.

use thiserror::Error;

/// Result type alias using cardcheck-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the LLM gateway (C3), classified per the taxonomy
/// the orchestrator needs to decide retry vs. terminal-failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 401/403 from the backend, or a locally-detected missing API key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// 404, or a model id the backend doesn't recognize.
    #[error("model or endpoint not found: {0}")]
    NotFound(String),

    /// 429, or response text mentioning a rate limit.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Response text mentioning insufficient balance/credits.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Read timeout elapsed waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure (DNS, TLS, reset) distinct from a timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend replied but no JSON could be recovered after all
    /// fallback extraction strategies were exhausted.
    #[error("could not parse a structured response: {0}")]
    BadResponse(String),

    /// Anything else, including provider-specific error bodies we don't
    /// special-case.
    #[error("unknown gateway error: {0}")]
    Unknown(String),
}

impl GatewayError {
    /// Classify an HTTP status code plus response body into a taxonomy entry,
    /// the way the aggregator-aware error messages in the original tool did
    /// by substring-matching the error text.
    pub fn classify(status: Option<u16>, body: &str) -> Self {
        let lower = body.to_lowercase();
        match status {
            Some(401) | Some(403) => return GatewayError::Auth(body.to_string()),
            Some(404) => return GatewayError::NotFound(body.to_string()),
            Some(429) => return GatewayError::RateLimit(body.to_string()),
            _ => {}
        }
        if lower.contains("rate limit") {
            GatewayError::RateLimit(body.to_string())
        } else if lower.contains("insufficient") || lower.contains("balance") {
            GatewayError::InsufficientFunds(body.to_string())
        } else if lower.contains("not found") || lower.contains("unauthorized") {
            if lower.contains("unauthorized") {
                GatewayError::Auth(body.to_string())
            } else {
                GatewayError::NotFound(body.to_string())
            }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            GatewayError::Timeout
        } else {
            GatewayError::Unknown(body.to_string())
        }
    }
}

/// Errors that can occur during verification pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The LLM gateway (C3) failed in a classified way.
    #[error("LLM gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Sandboxed program execution (C5) failed.
    #[error("sandbox execution error: {message}")]
    Sandbox { message: String },

    /// Claim cache (C2) is corrupt, unreadable, or otherwise unusable.
    #[error("cache error: {0}")]
    Cache(String),

    /// Subprocess communication error (structural-grep, notebook tooling).
    #[error("subprocess communication error: {0}")]
    SubprocessComm(String),

    /// Timeout during a non-gateway operation (e.g. sandbox wall-clock budget).
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying I/O error (cache filesystem operations, repo traversal).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error talking to an LLM backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error (missing/invalid RuntimeConfig field).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violation; should not occur in correct operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a sandbox execution error.
    pub fn sandbox(message: impl Into<String>) -> Self {
        Self::Sandbox {
            message: message.into(),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    /// Create a subprocess communication error.
    pub fn subprocess_comm(message: impl Into<String>) -> Self {
        Self::SubprocessComm(message.into())
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_by_status() {
        assert_eq!(
            GatewayError::classify(Some(429), "too many requests"),
            GatewayError::RateLimit("too many requests".to_string())
        );
    }

    #[test]
    fn classifies_rate_limit_by_text_when_status_unknown() {
        assert!(matches!(
            GatewayError::classify(None, "Error: rate limit exceeded, slow down"),
            GatewayError::RateLimit(_)
        ));
    }

    #[test]
    fn classifies_insufficient_funds_by_text() {
        assert!(matches!(
            GatewayError::classify(None, "Your account balance is insufficient"),
            GatewayError::InsufficientFunds(_)
        ));
    }

    #[test]
    fn classifies_auth_by_status() {
        assert!(matches!(
            GatewayError::classify(Some(401), "invalid api key"),
            GatewayError::Auth(_)
        ));
    }

    #[test]
    fn falls_back_to_unknown() {
        assert!(matches!(
            GatewayError::classify(Some(500), "internal server error"),
            GatewayError::Unknown(_)
        ));
    }
}
