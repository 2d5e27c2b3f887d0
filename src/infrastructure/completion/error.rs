use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the completion API
#[derive(Error, Debug)]
pub enum CompletionApiError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error (HTTP 5xx, including 529 overloaded)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error, including request timeouts
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Unexpected status code
    #[error("Unexpected response ({0}): {1}")]
    Unexpected(StatusCode, String),
}

impl CompletionApiError {
    /// Classify a non-success HTTP status into an error variant
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => Self::InvalidApiKey,
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimitExceeded,
            status if status.is_server_error() => Self::ServerError(status, body),
            status => Self::Unexpected(status, body),
        }
    }

    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_, _) | Self::Network(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidApiKey | Self::Forbidden(_) | Self::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(CompletionApiError::RateLimitExceeded.is_transient());
        assert!(CompletionApiError::ServerError(
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string()
        )
        .is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(CompletionApiError::InvalidRequest("bad".to_string()).is_permanent());
        assert!(CompletionApiError::InvalidApiKey.is_permanent());
        assert!(CompletionApiError::Forbidden("no".to_string()).is_permanent());
        assert!(CompletionApiError::NotFound.is_permanent());
    }

    #[test]
    fn test_classification_exclusivity() {
        let rate_limited = CompletionApiError::RateLimitExceeded;
        assert!(rate_limited.is_transient());
        assert!(!rate_limited.is_permanent());

        let invalid = CompletionApiError::InvalidRequest("bad".to_string());
        assert!(!invalid.is_transient());
        assert!(invalid.is_permanent());
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            CompletionApiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            CompletionApiError::InvalidApiKey
        ));
        assert!(matches!(
            CompletionApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            CompletionApiError::RateLimitExceeded
        ));
        assert!(matches!(
            CompletionApiError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            CompletionApiError::ServerError(StatusCode::BAD_GATEWAY, _)
        ));
        assert!(matches!(
            CompletionApiError::from_status(StatusCode::IM_A_TEAPOT, String::new()),
            CompletionApiError::Unexpected(_, _)
        ));
    }
}
