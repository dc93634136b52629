//! Error handling utilities for store operations
//!
//! Keeps the wording of storage errors consistent across the store.

use crate::error::AuthError;

/// Utility functions for common error handling patterns in store operations
pub struct ErrorUtils;

impl ErrorUtils {
    /// Creates a serialization error with consistent formatting
    pub fn serialization_error(context: &str, error: serde_json::Error) -> AuthError {
        AuthError::Serialization(format!("Serialization failed for {}: {}", context, error))
    }

    /// Creates a deserialization error with consistent formatting
    pub fn deserialization_error(context: &str, error: serde_json::Error) -> AuthError {
        AuthError::Serialization(format!("Deserialization failed for {}: {}", context, error))
    }

    /// Creates a database operation error with consistent formatting
    pub fn database_error(operation: &str, error: sled::Error) -> AuthError {
        AuthError::Store(format!("Database {} failed: {}", operation, error))
    }

    /// Creates a lock acquisition error with consistent formatting
    pub fn lock_error(resource: &str) -> AuthError {
        AuthError::Store(format!("Failed to acquire lock for {}", resource))
    }

    /// Creates an invalid document error with consistent formatting
    pub fn invalid_document(details: &str) -> AuthError {
        AuthError::Serialization(format!("Invalid document: {}", details))
    }

    /// Helper for converting sled errors in database operations
    pub fn from_sled_error(operation: &str) -> impl Fn(sled::Error) -> AuthError + '_ {
        move |e| Self::database_error(operation, e)
    }

    /// Helper for converting serialization errors
    pub fn from_serialization_error(
        context: &str,
    ) -> impl Fn(serde_json::Error) -> AuthError + '_ {
        move |e| Self::serialization_error(context, e)
    }

    /// Helper for converting deserialization errors
    pub fn from_deserialization_error(
        context: &str,
    ) -> impl Fn(serde_json::Error) -> AuthError + '_ {
        move |e| Self::deserialization_error(context, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let sled_err = sled::Error::Unsupported("test".to_string());
        let db_error = ErrorUtils::database_error("insert", sled_err);
        assert!(matches!(db_error, AuthError::Store(_)));
        assert!(db_error.to_string().contains("Database insert failed"));

        if let Err(json_err) = serde_json::from_str::<serde_json::Value>("invalid json") {
            let ser_error = ErrorUtils::deserialization_error("document", json_err);
            assert!(matches!(ser_error, AuthError::Serialization(_)));
        }
    }

    #[test]
    fn test_lock_error() {
        let error = ErrorUtils::lock_error("views");
        assert!(matches!(error, AuthError::Store(_)));
    }
}
