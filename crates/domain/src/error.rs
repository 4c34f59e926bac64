//! Unified error types for the domain layer
//!
//! Provides a common error type that can be used across all domain operations,
//! enabling consistent error handling without forcing adapters to use String or anyhow.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Snapshot document is missing required top-level mappings
    #[error("Malformed snapshot: missing {}", missing.join(", "))]
    MalformedSnapshot { missing: Vec<&'static str> },

    /// Operation requires GM privilege
    #[error("Not authorized: {0}")]
    Unauthorized(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if !(1..=20).contains(&value) {
    ///     return Err(DomainError::validation("roll must be between 1 and 20"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    /// Create a malformed snapshot error naming the missing keys
    pub fn malformed_snapshot(missing: Vec<&'static str>) -> Self {
        Self::MalformedSnapshot { missing }
    }

    /// Create an authorization error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("roll out of range");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: roll out of range");
    }

    #[test]
    fn test_malformed_snapshot_lists_missing_keys() {
        let err = DomainError::malformed_snapshot(vec!["connections", "npcRegistry"]);
        assert_eq!(
            err.to_string(),
            "Malformed snapshot: missing connections, npcRegistry"
        );
    }

    #[test]
    fn test_invalid_state_transition_error() {
        let err = DomainError::invalid_state_transition("Stranger -> Friend");
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
        assert!(err.to_string().contains("Stranger -> Friend"));
    }
}
