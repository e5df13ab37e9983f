//! Local filesystem storage

use std::path::{Path, PathBuf};

use super::{validate_file_name, FileProvider};
use crate::error::{Error, Result};

/// Files stored flat in one directory
#[derive(Debug, Clone)]
pub struct LocalFileProvider {
    base_path: PathBuf,
}

impl LocalFileProvider {
    /// Open `base_path`, creating it if needed
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        tokio::fs::create_dir_all(&base_path).await?;
        let base_path = tokio::fs::canonicalize(&base_path).await?;

        tracing::debug!(path = %base_path.display(), "Opened local storage");

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, name: &str) -> Result<PathBuf> {
        validate_file_name(name)?;
        Ok(self.base_path.join(name))
    }
}

#[async_trait::async_trait]
impl FileProvider for LocalFileProvider {
    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => {
                    tracing::warn!(name = ?name, "Skipping file with non UTF-8 name");
                }
            }
        }

        // read_dir order is platform dependent
        names.sort();
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(name)?;
        tracing::debug!(file = %name, "Reading file");
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::from_io(name, e))
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(name)?;
        tracing::debug!(file = %name, size = data.len(), "Writing file");
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.file_path(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Error::from_io(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_read_remove() {
        let temp_dir = TempDir::new().unwrap();
        let files = LocalFileProvider::new(temp_dir.path()).await.unwrap();

        files.write("a.txt", b"alpha").await.unwrap();
        assert!(files.exists("a.txt").await.unwrap());
        assert_eq!(files.read("a.txt").await.unwrap(), b"alpha");

        files.remove("a.txt").await.unwrap();
        assert!(!files.exists("a.txt").await.unwrap());
        assert!(matches!(files.read("a.txt").await, Err(Error::NotFound(_))));
        assert!(matches!(files.remove("a.txt").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let files = LocalFileProvider::new(temp_dir.path()).await.unwrap();

        files.write("c", b"3").await.unwrap();
        files.write("a", b"1").await.unwrap();
        files.write("b", b"2").await.unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();

        assert_eq!(files.list().await.unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deep").join("storage");
        let files = LocalFileProvider::new(&path).await.unwrap();

        assert!(path.is_dir());
        assert!(files.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let files = LocalFileProvider::new(temp_dir.path()).await.unwrap();

        let result = files.write("../escape", b"x").await;
        assert!(matches!(result, Err(Error::InvalidFileName(_))));
    }
}
