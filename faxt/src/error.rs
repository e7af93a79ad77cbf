//! Error handling module for the faxt CLI.
//!
//! This module provides custom error types using `thiserror` for structured
//! error handling throughout the application.

use thiserror::Error;

/// Main error type for the faxt CLI application.
#[derive(Error, Debug)]
pub enum FaxtError {
    /// Error when a required configuration is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error when input validation fails.
    #[error("validation error: {0}")]
    Validation(String),

    /// Error from the underlying managed heap.
    #[error("heap error: {0}")]
    Heap(#[from] fgc::HeapError),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when JSON serialization/deserialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using FaxtError.
pub type Result<T> = std::result::Result<T, FaxtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = FaxtError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn heap_error_wraps_and_displays() {
        let err: FaxtError = fgc::HeapError::DictFull.into();
        assert!(matches!(err, FaxtError::Heap(_)));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let faxt_err: FaxtError = io_err.into();
        assert!(matches!(faxt_err, FaxtError::Io(_)));
    }
}
