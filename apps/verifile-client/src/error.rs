//! Error types for the Verifile client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] verifile_core::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Nothing to upload in local storage")]
    NothingToUpload,
}

impl ClientError {
    /// True when downloaded content was rejected by the proof check
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, ClientError::Core(e) if e.is_verification_failure())
    }
}
