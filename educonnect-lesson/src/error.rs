//! Error types for educonnect-lesson
//!
//! Only read paths (timeline fetch, current-lesson lookup, content loading,
//! chat) surface these. Presence writes absorb their failures.

use thiserror::Error;

/// Main error type for educonnect-lesson
#[derive(Error, Debug)]
pub enum Error {
    /// Request never produced a response (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Collaborator answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Errors from the shared crate (config, storage)
    #[error(transparent)]
    Common(#[from] educonnect_common::Error),

    /// Background task failed before producing a result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status for `Status` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// Convenience Result type using educonnect-lesson Error
pub type Result<T> = std::result::Result<T, Error>;

/// Turn a non-success response into `Error::Status`
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    Err(Error::Status {
        status: status.as_u16(),
        message,
    })
}
