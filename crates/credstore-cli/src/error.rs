//! Error types for credstore-cli

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] credstore_core::CredStoreError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}
