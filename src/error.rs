//! Error types for the LSH index.

use std::fmt;
use thiserror::Error;

/// Classification of index errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A build- or query-time parameter is invalid or inconsistent.
    InvalidParameter,
    /// The requested operation is not supported on this storage layout.
    UnsupportedLayout,
    /// A caller-side precondition was violated.
    PreconditionViolated,
    /// An allocation could not be satisfied.
    Allocation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidParameter => write!(f, "INVALID_PARAMETER"),
            ErrorKind::UnsupportedLayout => write!(f, "UNSUPPORTED_LAYOUT"),
            ErrorKind::PreconditionViolated => write!(f, "PRECONDITION_VIOLATED"),
            ErrorKind::Allocation => write!(f, "ALLOCATION"),
        }
    }
}

/// Main error type for index operations.
#[derive(Error, Debug, Clone)]
pub struct LshError {
    kind: ErrorKind,
    message: String,
}

impl LshError {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    // Convenience constructors

    /// Create an invalid-parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, msg)
    }

    /// Create an unsupported-layout error.
    pub fn unsupported_layout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedLayout, msg)
    }

    /// Create a precondition-violated error.
    pub fn precondition_violated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionViolated, msg)
    }

    /// Create an allocation error.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Allocation, msg)
    }
}

impl fmt::Display for LshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, LshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LshError::invalid_parameter("k must be even");
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(err.message(), "k must be even");
    }

    #[test]
    fn test_error_display() {
        let err = LshError::unsupported_layout("query on statistics table");
        let display = format!("{}", err);
        assert!(display.contains("UNSUPPORTED_LAYOUT"));
        assert!(display.contains("statistics"));
    }
}
