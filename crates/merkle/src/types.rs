//! Core types for the authenticated file ledger

use serde::{Deserialize, Serialize};

/// 32-byte digest
pub type Hash32 = [u8; 32];

/// One uploaded content blob, identified by its digest and insertion position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub digest: Hash32,
    pub position: usize,
}

/// Inclusion proof
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling digests from the leaf level up to, not including, the root
    pub siblings: Vec<Hash32>,
}

impl MerkleProof {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }
}

impl From<Vec<Hash32>> for MerkleProof {
    fn from(siblings: Vec<Hash32>) -> Self {
        Self { siblings }
    }
}

/// Root of the tree at a given size
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub root: Hash32,
    pub leaf_count: u64,
}
