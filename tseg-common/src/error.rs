//! Common error types for tumour-seg

use thiserror::Error;

/// Common result type for tumour-seg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the tumour-seg crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested file or directory not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input (CLI argument, subject list entry)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
