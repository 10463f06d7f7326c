//! Unified error types for the Courier workspace.

use thiserror::Error;

/// Result alias for Courier core operations.
pub type CourierResult<T> = Result<T, CourierError>;

/// Unified error type for the Courier messaging layer.
#[derive(Error, Debug)]
pub enum CourierError {
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CourierError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is retriable by the caller.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CourierError::not_found("Job", "j1").error_code(), "NOT_FOUND");
        assert_eq!(CourierError::validation("bad payload").error_code(), "VALIDATION_ERROR");
        assert_eq!(CourierError::conflict("duplicate").error_code(), "CONFLICT");
        assert_eq!(CourierError::internal("oops").error_code(), "INTERNAL_ERROR");
        assert_eq!(CourierError::Database("down".into()).error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_error_constructors() {
        let not_found = CourierError::not_found("Job", "j-42");
        assert!(not_found.to_string().contains("Job"));
        assert!(not_found.to_string().contains("j-42"));

        let validation = CourierError::validation("missing field");
        assert!(validation.to_string().contains("missing field"));

        let conflict = CourierError::conflict("already exists");
        assert!(conflict.to_string().contains("already exists"));
    }

    #[test]
    fn test_retriable_errors() {
        assert!(CourierError::Database("connection lost".into()).is_retriable());
        assert!(!CourierError::not_found("Job", "j1").is_retriable());
        assert!(!CourierError::validation("bad").is_retriable());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CourierError::from(json_err);
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
