//! Error types for the dashboard components

use dkh_backend::BackendError;
use dkh_core::DocumentId;
use thiserror::Error;

/// Result type alias for dashboard operations
pub type AdminResult<T> = Result<T, AdminError>;

/// Errors raised by the session provider and the entries view
#[derive(Error, Debug)]
pub enum AdminError {
    /// The auth service or document store failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// No record with this identifier is currently displayed
    #[error("No entry \"{id}\" in the \"{collection}\" collection")]
    UnknownEntry {
        /// Collection name
        collection: String,
        /// Document identifier
        id: DocumentId,
    },

    /// Confirmation was requested with no delete candidate
    #[error("No deletion is awaiting confirmation")]
    NoPendingDelete,

    /// The action needs a signed-in operator
    #[error("Not signed in")]
    NotSignedIn,

    /// Invalid dashboard configuration
    #[error(transparent)]
    Core(#[from] dkh_core::Error),
}

impl AdminError {
    /// Create an unknown-entry error
    pub fn unknown_entry(collection: impl Into<String>, id: &DocumentId) -> Self {
        Self::UnknownEntry {
            collection: collection.into(),
            id: id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backend_errors_pass_through() {
        let error: AdminError = BackendError::authentication("X", "Invalid email or password.").into();
        assert_eq!(error.to_string(), "Invalid email or password.");
    }

    #[test]
    fn test_unknown_entry_display() {
        let error = AdminError::unknown_entry("consultations", &DocumentId::from("a"));
        assert_eq!(
            error.to_string(),
            "No entry \"a\" in the \"consultations\" collection"
        );
    }
}
