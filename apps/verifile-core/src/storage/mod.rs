//! File storage backends
//!
//! Flat namespace of named files. Listing order is the leaf order of the
//! Merkle tree, so every backend must list an unchanged file set in the
//! same order every time.

mod local;
mod memory;

pub use local::LocalFileProvider;
pub use memory::MemoryFileProvider;

use crate::error::{Error, Result};

/// Trait for file storage backends
#[async_trait::async_trait]
pub trait FileProvider: Send + Sync {
    /// File names in stable order
    async fn list(&self) -> Result<Vec<String>>;

    /// Read a file's content
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or overwrite a file
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;

    async fn remove(&self, name: &str) -> Result<()>;
}

/// Reject names that are empty or could leave the storage directory
pub fn validate_file_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');

    if invalid {
        return Err(Error::InvalidFileName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name(".hidden").is_ok());

        for name in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(
                matches!(validate_file_name(name), Err(Error::InvalidFileName(_))),
                "{:?} should be rejected",
                name
            );
        }
    }
}
