//! Error types for the Merkle core and its storage collaborators

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A tree cannot be built from zero leaves
    #[error("Cannot build a Merkle tree from an empty leaf sequence")]
    EmptyInput,

    /// Leaf hash, file or root-hash record is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tree operation requested before any successful build
    #[error("No Merkle tree has been built yet")]
    NoTree,

    /// The proof commits to a different root than the one we trust
    #[error("Root hash mismatch: expected {expected}, proof claims {actual}")]
    RootHashMismatch { expected: String, actual: String },

    /// Replaying the proof does not reproduce its root
    #[error("Proof is invalid: content does not match the committed root")]
    ProofInvalid,

    /// File name would escape the storage directory
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Malformed download payload
    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map an I/O error on `name` to `NotFound` when the file is missing
    pub(crate) fn from_io(name: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(name.to_string())
        } else {
            Error::Io(err)
        }
    }

    /// Verification failures that must block acceptance of downloaded content
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Error::RootHashMismatch { .. } | Error::ProofInvalid)
    }
}
