//! # Error Types
//!
//! Domain-specific error types for consulta-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  consulta-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  consulta-db errors (separate crate)                                   │
//! │  └── DbError          - Local store failures                           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller notification     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Taxonomy
//! Every failure falls in one of three buckets (see [`ErrorKind`]):
//! 1. **Validation** - missing field, bad CNPJ; the save is blocked
//! 2. **Stale reference** - an id that no longer resolves; normally healed
//!    silently by reconciliation, only surfaced by the store when a caller
//!    asks for a specific record (`DbError::NotFound`)
//! 3. **Remote** - the REST collaborator answered `success: false`
//!
//! None of these is fatal; each is contained to the action that raised it.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An update was requested for a draft that was never saved.
    #[error("{entity} has no id; create it before updating")]
    MissingId { entity: String },

    /// The remote API answered with `success: false` or without data.
    #[error("Remote API error: {message}")]
    Remote { message: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Coarse classification of an error, used to pick a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StaleReference,
    Remote,
}

impl CoreError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) | CoreError::MissingId { .. } => ErrorKind::Validation,
            CoreError::Remote { .. } => ErrorKind::Remote,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when form input doesn't meet requirements.
/// Used to block a save before anything is submitted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric id, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A national document failed its check-digit test.
    #[error("{document} is invalid")]
    InvalidDocument { document: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::MissingId {
            entity: "Plan".to_string(),
        };
        assert_eq!(err.to_string(), "Plan has no id; create it before updating");
        let err = CoreError::Remote {
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Remote API error: timeout");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidDocument {
            document: "CNPJ".to_string(),
        };
        assert_eq!(err.to_string(), "CNPJ is invalid");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "slug".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_error_kinds() {
        let missing = CoreError::MissingId {
            entity: "Plan".to_string(),
        };
        assert_eq!(missing.kind(), ErrorKind::Validation);
        assert_eq!(
            CoreError::Remote {
                message: String::new()
            }
            .kind(),
            ErrorKind::Remote
        );
    }
}
