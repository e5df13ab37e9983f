//! Tree lifecycle coordinator
//!
//! Owns the current Merkle tree for one file set. `build_tree` is the only
//! mutator; it builds a complete tree first and then swaps it in, so readers
//! observe either the previous tree or the new one.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::hash::HashProvider;
use crate::leaves::LeafSequence;
use crate::proof::Proof;
use crate::storage::FileProvider;
use crate::tree::MerkleTree;

/// Current tree bound to a leaf sequence
#[derive(Debug)]
pub struct TreeCoordinator {
    leaves: LeafSequence,
    tree: RwLock<Option<Arc<MerkleTree>>>,
}

impl TreeCoordinator {
    pub fn new(files: Arc<dyn FileProvider>, hasher: Arc<dyn HashProvider>) -> Self {
        Self::from_sequence(LeafSequence::new(files, hasher))
    }

    pub fn from_sequence(leaves: LeafSequence) -> Self {
        Self {
            leaves,
            tree: RwLock::new(None),
        }
    }

    pub fn leaves(&self) -> &LeafSequence {
        &self.leaves
    }

    /// Rebuild from the current file set and return the new root hash.
    ///
    /// On failure the previous tree stays current.
    pub async fn build_tree(&self) -> Result<String> {
        let entries = self.leaves.entries().await?;
        for (name, hash) in &entries {
            tracing::trace!(file = %name, leaf = %hash, "Leaf");
        }

        let tree = MerkleTree::build(
            entries.into_iter().map(|(_, hash)| hash),
            self.leaves.hasher().clone(),
        )?;
        let root_hash = tree.root_hash().to_string();

        tracing::info!(
            leaf_count = tree.leaf_count(),
            root_hash = %root_hash,
            "Merkle tree rebuilt"
        );

        *self.tree.write() = Some(Arc::new(tree));
        Ok(root_hash)
    }

    /// Snapshot of the current tree
    pub fn current(&self) -> Result<Arc<MerkleTree>> {
        self.tree.read().clone().ok_or(Error::NoTree)
    }

    pub fn is_built(&self) -> bool {
        self.tree.read().is_some()
    }

    pub fn root_hash(&self) -> Result<String> {
        Ok(self.current()?.root_hash().to_string())
    }

    /// Proof for a file, resolved through its current content
    pub async fn make_proof(&self, name: &str) -> Result<Proof> {
        let tree = self.current()?;
        let leaf = self.leaves.hash_of(name).await?;
        tree.make_proof(&leaf).map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!(
                "{} is not part of the current tree (content changed since the last build?)",
                name
            )),
            other => other,
        })
    }

    pub fn verify_proof(&self, target: &str, proof: &Proof) -> Result<bool> {
        Ok(self.current()?.verify_proof(target, proof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hasher;
    use crate::storage::MemoryFileProvider;

    fn coordinator(files: Arc<MemoryFileProvider>) -> TreeCoordinator {
        TreeCoordinator::new(files, Arc::new(Sha256Hasher))
    }

    #[tokio::test]
    async fn test_operations_before_build() {
        let files = Arc::new(MemoryFileProvider::with_files([("a", "alpha")]));
        let coordinator = coordinator(files);

        assert!(!coordinator.is_built());
        assert!(matches!(coordinator.root_hash(), Err(Error::NoTree)));
        assert!(matches!(coordinator.make_proof("a").await, Err(Error::NoTree)));
        assert!(matches!(
            coordinator.verify_proof("x", &Proof::empty("x")),
            Err(Error::NoTree)
        ));
    }

    #[tokio::test]
    async fn test_build_empty_file_set() {
        let coordinator = coordinator(Arc::new(MemoryFileProvider::new()));
        assert!(matches!(coordinator.build_tree().await, Err(Error::EmptyInput)));
        assert!(!coordinator.is_built());
    }

    #[tokio::test]
    async fn test_proof_for_each_file() {
        let files = Arc::new(MemoryFileProvider::with_files([
            ("one", "first file"),
            ("two", "second file"),
            ("three", "third file"),
        ]));
        let coordinator = coordinator(files);
        let root = coordinator.build_tree().await.unwrap();
        assert_eq!(coordinator.root_hash().unwrap(), root);

        for name in ["one", "two", "three"] {
            let proof = coordinator.make_proof(name).await.unwrap();
            let leaf = coordinator.leaves().hash_of(name).await.unwrap();
            assert_eq!(proof.root_hash, root);
            assert!(coordinator.verify_proof(&leaf, &proof).unwrap());
        }

        assert!(matches!(coordinator.make_proof("four").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tree_is_stale_until_rebuilt() {
        let files = Arc::new(MemoryFileProvider::with_files([("one", "1"), ("two", "2")]));
        let coordinator = coordinator(files.clone());
        let old_root = coordinator.build_tree().await.unwrap();

        files.write("three", b"3").await.unwrap();
        assert_eq!(coordinator.root_hash().unwrap(), old_root);
        assert!(matches!(coordinator.make_proof("three").await, Err(Error::NotFound(_))));

        let new_root = coordinator.build_tree().await.unwrap();
        assert_ne!(new_root, old_root);
        assert!(coordinator.make_proof("three").await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_build_keeps_previous_tree() {
        let files = Arc::new(MemoryFileProvider::with_files([("one", "1")]));
        let coordinator = coordinator(files.clone());
        let root = coordinator.build_tree().await.unwrap();

        files.remove("one").await.unwrap();
        assert!(matches!(coordinator.build_tree().await, Err(Error::EmptyInput)));
        assert_eq!(coordinator.root_hash().unwrap(), root);
    }

    #[tokio::test]
    async fn test_snapshot_survives_rebuild() {
        let files = Arc::new(MemoryFileProvider::with_files([("one", "1")]));
        let coordinator = coordinator(files.clone());
        coordinator.build_tree().await.unwrap();
        let snapshot = coordinator.current().unwrap();

        files.write("two", b"2").await.unwrap();
        coordinator.build_tree().await.unwrap();

        assert_eq!(snapshot.leaf_count(), 1);
        assert_eq!(coordinator.current().unwrap().leaf_count(), 2);
    }
}
