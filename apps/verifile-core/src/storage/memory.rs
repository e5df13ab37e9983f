//! In-memory storage

use parking_lot::RwLock;

use super::{validate_file_name, FileProvider};
use crate::error::{Error, Result};

/// Files held in memory, listed in insertion order
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    files: RwLock<Vec<(String, Vec<u8>)>>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with `(name, content)` pairs in order
    pub fn with_files<I, N, D>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<Vec<u8>>,
    {
        let files = files
            .into_iter()
            .map(|(name, data)| (name.into(), data.into()))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }
}

#[async_trait::async_trait]
impl FileProvider for MemoryFileProvider {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.read().iter().map(|(name, _)| name.clone()).collect())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_file_name(name)?;
        let mut files = self.files.write();
        match files.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data.to_vec(),
            None => files.push((name.to_string(), data.to_vec())),
        }
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.files.read().iter().any(|(n, _)| n == name))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let mut files = self.files.write();
        let before = files.len();
        files.retain(|(n, _)| n != name);
        if files.len() == before {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(())
    }
}
