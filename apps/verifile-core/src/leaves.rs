//! Leaf hash sequence
//!
//! Turns the current file set into the ordered leaf hashes the tree is built
//! from. Order is the file provider's listing order.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::hash::{HashProvider, LeafHash};
use crate::storage::FileProvider;

/// Leaf hashes of the files in one storage backend
pub struct LeafSequence {
    files: Arc<dyn FileProvider>,
    hasher: Arc<dyn HashProvider>,
    cursor: Vec<String>,
    position: usize,
}

impl fmt::Debug for LeafSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafSequence")
            .field("cursor_len", &self.cursor.len())
            .field("position", &self.position)
            .finish()
    }
}

impl LeafSequence {
    /// Create a sequence with an empty cursor; call `reset` before `advance`
    pub fn new(files: Arc<dyn FileProvider>, hasher: Arc<dyn HashProvider>) -> Self {
        Self {
            files,
            hasher,
            cursor: Vec::new(),
            position: 0,
        }
    }

    pub fn hasher(&self) -> &Arc<dyn HashProvider> {
        &self.hasher
    }

    /// Snapshot the current listing and rewind the cursor to its start
    pub async fn reset(&mut self) -> Result<()> {
        self.cursor = self.files.list().await?;
        self.position = 0;
        Ok(())
    }

    /// Hash of the next file in the snapshot, `None` once exhausted.
    ///
    /// A failed read leaves the cursor on the same file.
    pub async fn advance(&mut self) -> Result<Option<LeafHash>> {
        let Some(name) = self.cursor.get(self.position) else {
            return Ok(None);
        };
        let hash = self.hash_of(name).await?;
        self.position += 1;
        Ok(Some(hash))
    }

    pub fn has_more(&self) -> bool {
        self.position < self.cursor.len()
    }

    /// Leaf hash of one file, independent of the cursor
    pub async fn hash_of(&self, name: &str) -> Result<LeafHash> {
        let content = self.files.read(name).await?;
        Ok(self.hasher.leaf_hash(&content))
    }

    /// All leaf hashes of the current file set, in listing order.
    ///
    /// Lists afresh and does not touch the cursor.
    pub async fn full_sequence(&self) -> Result<Vec<LeafHash>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|(_, hash)| hash)
            .collect())
    }

    /// Like `full_sequence`, keeping each file name next to its hash
    pub async fn entries(&self) -> Result<Vec<(String, LeafHash)>> {
        let names = self.files.list().await?;
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let hash = self.hash_of(&name).await?;
            entries.push((name, hash));
        }
        Ok(entries)
    }
}
