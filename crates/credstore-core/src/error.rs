//! Error types for credstore-core

use thiserror::Error;

/// Result type alias for credential store operations
pub type Result<T> = std::result::Result<T, CredStoreError>;

/// Credential store error types
#[derive(Error, Debug)]
pub enum CredStoreError {
    #[error("Credential not found at index {0}")]
    EntryNotFound(usize),

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
