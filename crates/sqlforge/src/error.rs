//! Error types for sqlforge

use thiserror::Error;

/// Result type alias for sqlforge operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for statement compilation
#[derive(Clone, Debug, Error)]
pub enum SqlError {
    /// A type is missing table or key metadata that the operation requires
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// The builder API was invoked in an unsupported way
    #[error("Usage error: {0}")]
    Usage(String),

    /// An expression node the compiler does not implement for this clause
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// Malformed builder state detected before compilation
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SqlError {
    /// Create a metadata error
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata(message.into())
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a metadata error
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Metadata(_))
    }

    /// Check if this is a usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Check if this is an unsupported-construct error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
