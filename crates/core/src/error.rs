//! Error types for Shepard

use thiserror::Error;

/// Main error type for Shepard operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid configuration: {name} = {value} ({reason})")]
    InvalidConfiguration {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Insufficient samples: {available} stored, {required} required")]
    InsufficientSamples { available: usize, required: usize },
}

/// Result type alias for Shepard operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_samples_reports_both_counts() {
        let err = Error::InsufficientSamples {
            available: 3,
            required: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('5'), "got: {}", msg);
    }

    #[test]
    fn test_invalid_configuration_message() {
        let err = Error::InvalidConfiguration {
            name: "power",
            value: "-1".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration: power = -1 (must be positive)"
        );
    }
}
