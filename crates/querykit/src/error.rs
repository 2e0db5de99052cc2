//! Error types for querykit

use std::convert::Infallible;
use thiserror::Error;

/// Result type alias for querykit operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while building, rendering or executing statements.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Builder state cannot produce a valid statement
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operator outside `=, >, <, >=, <=, !=, LIKE`
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Failure reported by the executor, passed through untouched
    #[error("Executor error: {0}")]
    Executor(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl SqlError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary executor failure.
    pub fn executor<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Executor(Box::new(err))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an unsupported operator error
    pub fn is_unsupported_operator(&self) -> bool {
        matches!(self, Self::UnsupportedOperator(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error came from the executor backend
    pub fn is_executor(&self) -> bool {
        matches!(self, Self::Executor(_))
    }
}

impl From<tokio_postgres::Error> for SqlError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::executor(err)
    }
}

// Lets typed `Op` arguments flow through the same `TryInto<Op>` bounds as `&str`.
impl From<Infallible> for SqlError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}
