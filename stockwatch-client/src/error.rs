//! Error types for the feed client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when fetching a product feed
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The storefront rejected the request with 401
    #[error("Authentication failed (status 401), response headers: {headers}")]
    Unauthorized {
        /// Response headers, for diagnosing what the storefront wanted
        headers: String,
    },

    /// Any other non-success status code
    #[error("Feed request failed (status {status}): {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body, if readable
        message: String,
    },

    /// Response body was not a product feed
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create a status error from status code and body
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is an authentication failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::HttpStatus { status, .. } => Some(*status),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            Self::ParseError(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_classification() {
        let err = ClientError::Unauthorized {
            headers: "{}".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_http_status_classification() {
        let err = ClientError::http_status(503, "down");
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "Feed request failed (status 503): down");
    }

    #[test]
    fn test_parse_error_has_no_status() {
        let err = ClientError::ParseError("bad".to_string());
        assert_eq!(err.status(), None);
    }
}
