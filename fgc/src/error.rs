//! Error Module - heap error types
//!
//! Defines all error types surfaced by the managed heap.

use thiserror::Error;

/// Main error type for all heap operations.
#[derive(Debug, Error)]
pub enum HeapError {
    #[error("invalid heap: {reason}")]
    InvalidHeap { reason: String },

    #[error("out of space: requested {requested} bytes, {available} available")]
    OutOfSpace { requested: usize, available: usize },

    #[error("dict is full")]
    DictFull,

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fatal heap error: {0}")]
    Fatal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[cfg(feature = "json")]
    Json(#[from] serde_json::Error),
}

impl HeapError {
    /// Whether a caller might reasonably retry after handling this error
    /// (e.g. by growing a container or running the GC).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, HeapError::OutOfSpace { .. } | HeapError::DictFull)
    }
}

/// Result type alias for heap operations.
pub type Result<T> = std::result::Result<T, HeapError>;

/// Early-return with a [`HeapError::Fatal`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        return Err($crate::error::HeapError::Fatal(format!($fmt $(, $arg)*)))
    };
}

/// Return a [`HeapError`] unless the condition holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
