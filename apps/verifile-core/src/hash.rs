//! Hash provider
//!
//! Leaves hash raw file bytes. Internal nodes hash the concatenation of the
//! two child digest *strings*, so any party holding the hex digests can
//! recompute a parent without touching the original content.

use sha2::{Digest, Sha256};

/// Hex digest of one file's content
pub type LeafHash = String;

/// Leaf and node hashing used to build and verify trees
pub trait HashProvider: Send + Sync {
    /// Hash raw content into a leaf digest
    fn leaf_hash(&self, data: &[u8]) -> String;

    /// Hash two child digests into their parent digest
    fn combine(&self, left: &str, right: &str) -> String;
}

/// SHA-256 with lowercase hex output
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl HashProvider for Sha256Hasher {
    fn leaf_hash(&self, data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    fn combine(&self, left: &str, right: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_hash_is_hex_sha256() {
        let hash = Sha256Hasher.leaf_hash(b"Hello, World!");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_combine_hashes_concatenated_strings() {
        let hasher = Sha256Hasher;
        assert_eq!(hasher.combine("hash1", "hash2"), hasher.leaf_hash(b"hash1hash2"));
    }

    #[test]
    fn test_combine_is_order_sensitive() {
        let hasher = Sha256Hasher;
        assert_ne!(hasher.combine("a", "b"), hasher.combine("b", "a"));
    }
}
