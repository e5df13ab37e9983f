//! Binary Merkle tree
//!
//! Nodes live in an arena and refer to their children by index. When a
//! level has an odd number of nodes the last node is paired with itself, so
//! the duplicate is the same arena slot referenced twice rather than a copy.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hash::HashProvider;
use crate::proof::{Proof, Side};

/// Index of a node in the tree arena
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    hash: String,
    children: Option<(NodeId, NodeId)>,
}

/// Merkle tree over an ordered leaf-hash sequence
#[derive(Clone)]
pub struct MerkleTree {
    nodes: Vec<Node>,
    root: NodeId,
    leaf_count: usize,
    height: usize,
    hasher: Arc<dyn HashProvider>,
}

impl fmt::Debug for MerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("root_hash", &self.root_hash())
            .field("leaf_count", &self.leaf_count)
            .field("height", &self.height)
            .finish()
    }
}

impl MerkleTree {
    /// Build a tree from leaf hashes in order.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyInput` if `leaves` is empty.
    pub fn build<I, S>(leaves: I, hasher: Arc<dyn HashProvider>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut nodes: Vec<Node> = leaves
            .into_iter()
            .map(|hash| Node {
                hash: hash.into(),
                children: None,
            })
            .collect();

        if nodes.is_empty() {
            return Err(Error::EmptyInput);
        }

        let leaf_count = nodes.len();
        let mut level: Vec<NodeId> = (0..leaf_count).collect();
        let mut height = 1;

        while level.len() > 1 {
            if level.len() % 2 != 0 {
                let last = level[level.len() - 1];
                level.push(last);
            }

            let mut next_level = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks_exact(2) {
                let (left, right) = (pair[0], pair[1]);
                let hash = hasher.combine(&nodes[left].hash, &nodes[right].hash);
                nodes.push(Node {
                    hash,
                    children: Some((left, right)),
                });
                next_level.push(nodes.len() - 1);
            }

            level = next_level;
            height += 1;
        }

        let root = level[0];

        tracing::debug!(
            leaf_count = leaf_count,
            height = height,
            root_hash = %nodes[root].hash,
            "Built Merkle tree"
        );

        Ok(Self {
            nodes,
            root,
            leaf_count,
            height,
            hasher,
        })
    }

    pub fn root_hash(&self) -> &str {
        &self.nodes[self.root].hash
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of levels, counting the leaves and the root
    pub fn height(&self) -> usize {
        self.height
    }

    /// Generate an inclusion proof for `target`.
    ///
    /// The search is depth-first, left subtree before right. If several
    /// leaves share the same hash (files with identical content) the proof
    /// is for the first one in that order.
    ///
    /// A leaf left unpaired on an odd level is combined with itself. For
    /// that step the sibling equals the current hash, so its side marker is
    /// not binding: flipping it still verifies. Every other step's marker is.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no leaf equals `target`.
    pub fn make_proof(&self, target: &str) -> Result<Proof> {
        let mut proof = Proof::empty(self.root_hash());

        if !self.walk(self.root, target, &mut proof) {
            return Err(Error::NotFound(format!("hash {} is not a leaf of the tree", target)));
        }

        Ok(proof)
    }

    /// Pushes sibling hashes on the way back up, so the leaf's sibling ends
    /// up first.
    fn walk(&self, id: NodeId, target: &str, proof: &mut Proof) -> bool {
        let node = &self.nodes[id];
        let Some((left, right)) = node.children else {
            return node.hash == target;
        };

        if self.walk(left, target, proof) {
            proof.hashes.push(self.nodes[right].hash.clone());
            proof.indices.push(Side::Right);
            return true;
        }

        if self.walk(right, target, proof) {
            proof.hashes.push(self.nodes[left].hash.clone());
            proof.indices.push(Side::Left);
            return true;
        }

        false
    }

    /// Verify `proof` for `target` with this tree's hash provider.
    ///
    /// Only the hash provider is used; the proof may come from another tree.
    pub fn verify_proof(&self, target: &str, proof: &Proof) -> bool {
        verify_proof(self.hasher.as_ref(), target, proof)
    }
}

/// Replay `proof` from `target` and compare against the proof's root
pub fn verify_proof(hasher: &dyn HashProvider, target: &str, proof: &Proof) -> bool {
    if !proof.is_well_formed() {
        tracing::warn!(
            hashes = proof.hashes.len(),
            indices = proof.indices.len(),
            "Rejecting malformed proof"
        );
        return false;
    }

    let computed = proof
        .steps()
        .fold(target.to_string(), |current, (sibling, side)| match side {
            Side::Right => hasher.combine(&current, sibling),
            Side::Left => hasher.combine(sibling, &current),
        });

    computed == proof.root_hash
}
