//! Root-hash persistence
//!
//! A single slot holding the last committed root hash. There is no history:
//! every commit overwrites the previous value.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Trait for root-hash record backends
#[async_trait::async_trait]
pub trait RootHashStore: Send + Sync {
    /// Replace the committed root hash
    async fn store(&self, root_hash: &str) -> Result<()>;

    /// Load the committed root hash, `NotFound` if nothing was committed
    async fn load(&self) -> Result<String>;
}

/// Root hash kept in one file on disk
#[derive(Debug, Clone)]
pub struct FileRootHashStore {
    path: PathBuf,
}

impl FileRootHashStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl RootHashStore for FileRootHashStore {
    async fn store(&self, root_hash: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Readers see the old root or the new one, never a partial write
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, root_hash.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::info!(path = %self.path.display(), root_hash = %root_hash, "Committed root hash");
        Ok(())
    }

    async fn load(&self) -> Result<String> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("no root hash committed at {}", self.path.display()))
            } else {
                Error::Io(e)
            }
        })?;

        let root_hash = content.trim();
        if root_hash.is_empty() {
            return Err(Error::NotFound(format!(
                "root hash record at {} is empty",
                self.path.display()
            )));
        }
        Ok(root_hash.to_string())
    }
}

/// Root hash kept in memory
#[derive(Debug, Default)]
pub struct MemoryRootHashStore {
    root_hash: RwLock<Option<String>>,
}

impl MemoryRootHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RootHashStore for MemoryRootHashStore {
    async fn store(&self, root_hash: &str) -> Result<()> {
        *self.root_hash.write() = Some(root_hash.to_string());
        Ok(())
    }

    async fn load(&self) -> Result<String> {
        self.root_hash
            .read()
            .clone()
            .ok_or_else(|| Error::NotFound("no root hash committed".to_string()))
    }
}
