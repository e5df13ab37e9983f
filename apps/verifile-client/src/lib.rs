//! Verifile client
//!
//! Uploads a batch of local files, commits the batch's Merkle root locally
//! and later verifies every downloaded file against that root.

pub mod error;
pub mod generate;
pub mod service;

pub use error::{ClientError, Result};
pub use generate::generate_files;
pub use service::{DownloadReport, FileService, UploadReport};
