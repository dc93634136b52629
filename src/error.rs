//! # Error Handling
//!
//! Unified error type for the authorization source. Not-found conditions are
//! never errors here: lookups return empty results and mutations against
//! absent sections or items are no-ops. Only structural violations and
//! storage failures surface as an [`AuthError`].

use crate::config::ConfigError;
use thiserror::Error;

/// A single document that failed inside a bulk save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    /// Name of the entity whose document was not saved
    pub name: String,
    /// Rendered cause of the failure
    pub reason: String,
}

/// Unified error type for store, adapter and credential operations.
#[derive(Error, Debug)]
pub enum AuthError {
    // ========== Structural Violations ==========
    /// A section or item with this name already exists
    #[error("Duplicate {kind}: '{name}' already exists")]
    Duplicate { kind: String, name: String },

    // ========== Store Errors ==========
    /// The stored revision differs from the one supplied by the caller
    #[error("Write conflict on document {id}: revision is stale")]
    Conflict { id: String },

    /// Update or delete of a document the store does not hold
    #[error("Document not found in store: {id}")]
    DocumentMissing { id: String },

    /// Query against an index that was never defined
    #[error("Unknown view: {0}")]
    UnknownView(String),

    /// Some documents of a batch were not persisted; the rest were
    #[error("Bulk save failed for {} of {attempted} document(s)", .failures.len())]
    BulkSave {
        attempted: usize,
        failures: Vec<BulkFailure>,
    },

    /// Underlying database failure
    #[error("Store error: {0}")]
    Store(String),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ========== Credential and Configuration Errors ==========
    /// Password hashing failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Invalid configuration or relation binding
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    /// Create a duplicate-name error
    pub fn duplicate<K: Into<String>, N: Into<String>>(kind: K, name: N) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Whether re-issuing the same idempotent operation may converge.
    ///
    /// Duplicates and configuration errors always fail again. Conflicts,
    /// partial batches and store failures can succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::Conflict { .. } | AuthError::BulkSave { .. } | AuthError::Store(_)
        )
    }
}

impl From<sled::Error> for AuthError {
    fn from(error: sled::Error) -> Self {
        AuthError::Store(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        AuthError::Serialization(error.to_string())
    }
}

/// Result type alias for operations that can fail with an [`AuthError`]
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AuthError::Conflict { id: "x".into() }.is_retryable());
        assert!(AuthError::Store("io".into()).is_retryable());
        assert!(AuthError::BulkSave {
            attempted: 2,
            failures: vec![]
        }
        .is_retryable());
        assert!(!AuthError::duplicate("group", "admins").is_retryable());
        assert!(!AuthError::UnknownView("v".into()).is_retryable());
    }

    #[test]
    fn test_bulk_save_message_counts_failures() {
        let err = AuthError::BulkSave {
            attempted: 3,
            failures: vec![BulkFailure {
                name: "alice".into(),
                reason: "conflict".into(),
            }],
        };
        assert_eq!(err.to_string(), "Bulk save failed for 1 of 3 document(s)");
    }

    #[test]
    fn test_sled_error_conversion() {
        let err: AuthError = sled::Error::Unsupported("test".to_string()).into();
        assert!(matches!(err, AuthError::Store(_)));
    }
}
