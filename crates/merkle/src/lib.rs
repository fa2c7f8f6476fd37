//! Authenticated file ledger
//!
//! A binary hash tree over an append-only sequence of content digests, with
//! inclusion proofs that a party holding only the root can check.
//!
//! Internal nodes combine their children with a canonical ordering: the two
//! digests are sorted byte-wise before hashing. A proof is therefore just the
//! list of sibling digests, with no left/right markers. The tree is rebuilt in
//! full after every append.

pub mod checkpoint;
pub mod crypto;
mod leaves;
mod tree;
mod types;
mod verify;
pub mod wire;

pub use checkpoint::{CheckpointSigner, SignedCheckpoint};
pub use crypto::{Blake3Hasher, Hasher, Sha256Hasher};
pub use leaves::LeafStore;
pub use tree::MerkleTree;
pub use types::{Checkpoint, Hash32, Leaf, MerkleProof};
pub use verify::{verify_proof, verify_proof_with};

pub use ed25519_dalek::VerifyingKey;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("tree has no leaves")]
    EmptyTree,

    #[error("leaf position {position} out of range (leaf count {leaf_count})")]
    InvalidPosition { position: usize, leaf_count: usize },

    #[error("content not present in tree")]
    NotFound,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, MerkleError>;
