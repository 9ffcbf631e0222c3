//! Error types for the money manager library

use crate::validation::ValidationError;
use thiserror::Error;

/// Result type used across the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Required field missing or malformed; nothing was written
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// Explicit update of an income that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Reconciliation matched more than one reference row
    #[error("Ambiguous {entity}: {matches} matching rows")]
    AmbiguousReference { entity: &'static str, matches: usize },

    /// Any failure reported by SQLite (wraps rusqlite::Error)
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a single-field validation failure
    pub fn validation(field: &str, message: &str, context: &str) -> Self {
        Error::Validation(vec![ValidationError::new(field, message, context)])
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_joins_fields() {
        let err = Error::Validation(vec![
            ValidationError::new("person.name", "Required field is empty", "Income"),
            ValidationError::new("incomeSource.name", "Required field is empty", "Income"),
        ]);

        assert_eq!(
            err.to_string(),
            "Validation failed: [Income] person.name: Required field is empty; \
             [Income] incomeSource.name: Required field is empty"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_ambiguous_reference_display() {
        let err = Error::AmbiguousReference { entity: "person", matches: 2 };
        assert_eq!(err.to_string(), "Ambiguous person: 2 matching rows");
        assert!(!err.is_validation());
    }
}
