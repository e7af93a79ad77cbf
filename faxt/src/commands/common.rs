//! Common types and utilities for faxt commands.
//!
//! This module provides shared constants and utility functions used across
//! all command implementations to ensure consistency.

// ============================================================================
// Error Messages
// ============================================================================

/// Standard error message templates, shared across commands.
pub mod error_messages {
    pub const INPUT_PATH_NOT_EXIST: &str = "Input path does not exist:";
    pub const INPUT_PATH_NOT_FILE: &str = "Input path is not a file:";
    pub const OUTPUT_FILE_EXISTS: &str = "Output file already exists:";
    pub const HEAP_CAPACITY_TOO_SMALL: &str = "Capacity too small for heap contents:";
    pub const HEAP_INVALID: &str = "Heap file failed validation (bad magic or root offset):";
}

// ============================================================================
// Output Messages
// ============================================================================

/// Standard output message templates, shared across commands.
pub mod output_messages {
    pub const INFO: &str = "ℹ️ {}";
    pub const CREATED_FILE: &str = "✅ Wrote heap:";
    pub const LOADED_FILE: &str = "ℹ️ Loaded heap:";
    pub const GC_RAN: &str = "🧹 Collected:";
}
