//! Error types for the backend clients

use thiserror::Error;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by the auth service or the document store
#[derive(Error, Debug)]
pub enum BackendError {
    /// Sign-in or sign-out was rejected
    #[error("{message}")]
    Authentication {
        /// Service error code, e.g. `INVALID_LOGIN_CREDENTIALS`
        code: String,
        /// Human-readable message
        message: String,
    },

    /// Caller lacks access to the resource
    #[error("Missing or insufficient permissions: {message}")]
    PermissionDenied {
        /// Error message
        message: String,
    },

    /// Document does not exist
    #[error("No document to update: {collection}/{id}")]
    NotFound {
        /// Collection name
        collection: String,
        /// Document identifier
        id: String,
    },

    /// Service could not be reached or answered with a server error
    #[error("Service unavailable: {message}")]
    Unavailable {
        /// Error message
        message: String,
    },

    /// Live subscription failed
    #[error("Subscription failed: {message}")]
    Subscription {
        /// Error message
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Unexpected response: {message}")]
    Protocol {
        /// Error message
        message: String,
    },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Create an authentication error
    pub fn authentication(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a permission error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a subscription error
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Whether retrying the same request could succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_authentication_message_is_verbatim() {
        let error = BackendError::authentication("INVALID_PASSWORD", "Wrong password.");
        assert_eq!(error.to_string(), "Wrong password.");
    }

    #[test]
    fn test_not_found_display() {
        let error = BackendError::not_found("consultations", "a1");
        assert_eq!(error.to_string(), "No document to update: consultations/a1");
    }

    #[test]
    fn test_retryable() {
        assert!(BackendError::unavailable("503").is_retryable());
        assert!(!BackendError::permission_denied("rules").is_retryable());
        assert!(!BackendError::subscription("closed").is_retryable());
    }
}
