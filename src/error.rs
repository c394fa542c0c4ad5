//! Error types for kvtable
//!
//! Provides a unified error type for table and store operations.

use thiserror::Error;

/// Result type alias using TableError
pub type Result<T> = std::result::Result<T, TableError>;

/// Unified error type for kvtable operations
#[derive(Debug, Error)]
pub enum TableError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Table '{name}' is already registered with a different record type")]
    TableTypeMismatch { name: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Deserialization error at key '{key}': {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Counter at key '{key}' is not an integer: {value:?}")]
    CorruptCounter { key: String, value: String },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Log corruption detected: {0}")]
    LogCorruption(String),
}
