//! Common error types for EduConnect

use thiserror::Error;

/// Common result type for EduConnect operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the EduConnect crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage port could not read or persist a value
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
