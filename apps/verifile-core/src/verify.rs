//! Acceptance check for downloaded content

use crate::error::{Error, Result};
use crate::hash::{HashProvider, LeafHash};
use crate::proof::Proof;
use crate::tree::verify_proof;

/// Check downloaded `content` against `proof` and the locally trusted root.
///
/// The proof's own root is never trusted: it must equal `trusted_root`
/// before the hash chain is replayed. Returns the content's leaf hash.
///
/// # Errors
///
/// - `Error::RootHashMismatch` if the proof commits to another root
/// - `Error::ProofInvalid` if replaying the proof does not reach the root
pub fn verify_download(
    hasher: &dyn HashProvider,
    content: &[u8],
    proof: &Proof,
    trusted_root: &str,
) -> Result<LeafHash> {
    if proof.root_hash != trusted_root {
        return Err(Error::RootHashMismatch {
            expected: trusted_root.to_string(),
            actual: proof.root_hash.clone(),
        });
    }

    let leaf = hasher.leaf_hash(content);
    tracing::debug!(
        leaf = %leaf,
        steps = proof.hashes.len(),
        root_hash = %proof.root_hash,
        "Verifying proof"
    );

    if !verify_proof(hasher, &leaf, proof) {
        return Err(Error::ProofInvalid);
    }

    Ok(leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hasher;
    use crate::tree::MerkleTree;
    use std::sync::Arc;

    const FILES: [&[u8]; 3] = [b"first file", b"second file", b"third file"];

    fn tree() -> MerkleTree {
        let leaves = FILES.iter().map(|data| Sha256Hasher.leaf_hash(data));
        MerkleTree::build(leaves, Arc::new(Sha256Hasher)).unwrap()
    }

    #[test]
    fn test_accepts_genuine_content() {
        let tree = tree();
        let proof = tree.make_proof(&Sha256Hasher.leaf_hash(FILES[1])).unwrap();

        let leaf = verify_download(&Sha256Hasher, FILES[1], &proof, tree.root_hash()).unwrap();
        assert_eq!(leaf, Sha256Hasher.leaf_hash(FILES[1]));
    }

    #[test]
    fn test_rejects_corrupted_content() {
        let tree = tree();
        let proof = tree.make_proof(&Sha256Hasher.leaf_hash(FILES[1])).unwrap();

        let result = verify_download(&Sha256Hasher, b"second fil3", &proof, tree.root_hash());
        assert!(matches!(result, Err(Error::ProofInvalid)));
    }

    #[test]
    fn test_rejects_server_asserted_root() {
        let tree = tree();
        let proof = tree.make_proof(&Sha256Hasher.leaf_hash(FILES[0])).unwrap();
        let trusted = Sha256Hasher.leaf_hash(b"some other batch");

        let result = verify_download(&Sha256Hasher, FILES[0], &proof, &trusted);
        match result {
            Err(Error::RootHashMismatch { expected, actual }) => {
                assert_eq!(expected, trusted);
                assert_eq!(actual, tree.root_hash());
            }
            other => panic!("expected root hash mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_fabricated_proof_for_trusted_root() {
        let tree = tree();
        let forged = Proof {
            hashes: vec![Sha256Hasher.leaf_hash(b"forged")],
            root_hash: tree.root_hash().to_string(),
            indices: vec![crate::proof::Side::Right],
        };

        let result = verify_download(&Sha256Hasher, b"evil", &forged, tree.root_hash());
        assert!(matches!(result, Err(Error::ProofInvalid)));
    }
}
