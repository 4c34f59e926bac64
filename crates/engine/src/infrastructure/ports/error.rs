//! Error types for port operations.

/// Persistence operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Errors raised by the host's scene and vision queries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("Line of sight query failed: {0}")]
    LineOfSight(String),
    #[error("Token lookup failed: {0}")]
    Token(String),
}

/// Errors from message delivery and cross-process broadcast.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Broadcast failed: {0}")]
    Broadcast(String),
    #[error("Message delivery failed: {0}")]
    Delivery(String),
}
