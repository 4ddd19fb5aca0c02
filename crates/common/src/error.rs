//! Unified error taxonomy for the NEO impact service.

use thiserror::Error;

/// Failures talking to the NeoWs provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure: request timeout or connection error.
    #[error("provider request timed out: {0}")]
    Timeout(String),

    /// Provider answered 429 or 5xx.
    #[error("provider unavailable (status={status}): {message}")]
    Unavailable { status: u16, message: String },

    /// Provider refused the request (4xx other than 429).
    #[error("provider rejected request (status={status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider failed after {attempts_made} attempts: {cause}")]
    Exhausted {
        attempts_made: u32,
        cause: Box<ProviderError>,
    },

    #[error("provider request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_) | ProviderError::Unavailable { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cache backend error: {0}")]
    CacheBackend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(ProviderError::Timeout("slow".into()).is_retryable());
        assert!(ProviderError::Unavailable {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::MalformedResponse("html".into()).is_retryable());
        assert!(!ProviderError::Rejected {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::Cancelled.is_retryable());
    }

    #[test]
    fn test_exhausted_message_names_attempts() {
        let err = ProviderError::Exhausted {
            attempts_made: 3,
            cause: Box::new(ProviderError::Timeout("deadline".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"), "{msg}");
        assert!(msg.contains("deadline"), "{msg}");
    }
}
