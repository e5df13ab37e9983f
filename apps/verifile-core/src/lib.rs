//! Verifile core
//!
//! Merkle-tree inclusion proofs for a batch of files, plus the storage and
//! transfer pieces the server and client share.
//!
//! # Modules
//!
//! - `hash`: leaf and node hashing
//! - `leaves`: ordered leaf hashes of a file set
//! - `tree`: tree construction, proof generation and verification
//! - `coordinator`: owns the current tree for one file set
//! - `verify`: client-side acceptance check against a trusted root
//! - `storage`: file providers (local disk, memory)
//! - `root_store`: the single committed root-hash record
//! - `transfer`: multipart download payload codec
//! - `config`: environment configuration

pub mod config;
pub mod coordinator;
pub mod error;
pub mod hash;
pub mod leaves;
pub mod proof;
pub mod root_store;
pub mod storage;
pub mod transfer;
pub mod tree;
pub mod verify;

pub use config::Config;
pub use coordinator::TreeCoordinator;
pub use error::{Error, Result};
pub use hash::{HashProvider, LeafHash, Sha256Hasher};
pub use leaves::LeafSequence;
pub use proof::{Proof, Side};
pub use root_store::{FileRootHashStore, MemoryRootHashStore, RootHashStore};
pub use storage::{FileProvider, LocalFileProvider, MemoryFileProvider};
pub use tree::{verify_proof, MerkleTree};
pub use verify::verify_download;
