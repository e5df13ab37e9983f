//! Inclusion proof wire type
//!
//! A proof is serialized as parallel arrays to stay compatible with the
//! download payload format:
//!
//! ```json
//! { "hashes": ["..."], "rootHash": "...", "indices": [0, 1] }
//! ```
//!
//! `indices[i] == 0` means the sibling at step `i` is the right operand of
//! the combine function, `1` means it is the left operand.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which operand of `combine` the sibling hash is at one proof step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// `combine(current, sibling)`, wire value `0`
    Right,
    /// `combine(sibling, current)`, wire value `1`
    Left,
}

impl Side {
    pub fn wire_value(self) -> u8 {
        match self {
            Side::Right => 0,
            Side::Left => 1,
        }
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Right),
            1 => Some(Side::Left),
            _ => None,
        }
    }

    /// The opposite side
    pub fn flip(self) -> Self {
        match self {
            Side::Right => Side::Left,
            Side::Left => Side::Right,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Right => write!(f, "right"),
            Side::Left => write!(f, "left"),
        }
    }
}

impl Serialize for Side {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.wire_value())
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Side::from_wire(value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid proof index {}, expected 0 or 1", value))
        })
    }
}

/// Merkle inclusion proof for one leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Sibling hashes, from the leaf's sibling up to the root's child
    #[serde(alias = "ProofHashes")]
    pub hashes: Vec<String>,

    /// Root hash the proof was generated against
    #[serde(alias = "RootHash")]
    pub root_hash: String,

    /// Sibling side per step, same length as `hashes`
    #[serde(alias = "Indices")]
    pub indices: Vec<Side>,
}

impl Proof {
    /// Proof for a single-leaf tree: no steps
    pub fn empty(root_hash: impl Into<String>) -> Self {
        Self {
            hashes: Vec::new(),
            root_hash: root_hash.into(),
            indices: Vec::new(),
        }
    }

    /// Number of steps, or `None` when `hashes` and `indices` disagree
    pub fn step_count(&self) -> Option<usize> {
        (self.hashes.len() == self.indices.len()).then_some(self.hashes.len())
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty() && self.indices.is_empty()
    }

    pub fn is_well_formed(&self) -> bool {
        self.step_count().is_some()
    }

    /// Iterate `(sibling, side)` pairs in replay order
    pub fn steps(&self) -> impl Iterator<Item = (&str, Side)> + '_ {
        self.hashes
            .iter()
            .map(String::as_str)
            .zip(self.indices.iter().copied())
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
