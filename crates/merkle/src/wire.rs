//! JSON bodies exchanged between the file server and its clients.
//!
//! Raw bytes and digests travel as lowercase hex strings.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkpoint::SignedCheckpoint;
use crate::{Checkpoint, Hash32, MerkleProof};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("digest must be 32 bytes, got {0}")]
    DigestLength(usize),

    #[error("invalid public key: {0}")]
    Key(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    #[serde(with = "hex")]
    pub content: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub position: u64,
    pub checkpoint: CheckpointBody,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub name: String,
    #[serde(with = "hex")]
    pub content: Vec<u8>,
    pub merkle_proof: Vec<String>,
}

impl DownloadResponse {
    pub fn new(name: impl Into<String>, content: Vec<u8>, proof: &MerkleProof) -> Self {
        Self {
            name: name.into(),
            content,
            merkle_proof: proof.siblings.iter().map(hex::encode).collect(),
        }
    }

    pub fn proof(&self) -> Result<MerkleProof, WireError> {
        let siblings = self
            .merkle_proof
            .iter()
            .map(|s| parse_digest(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MerkleProof { siblings })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointBody {
    pub root: String,
    pub leaf_count: u64,
    pub signature: String,
    pub public_key: String,
}

impl CheckpointBody {
    pub fn new(signed: &SignedCheckpoint, key: &VerifyingKey) -> Self {
        Self {
            root: hex::encode(signed.checkpoint.root),
            leaf_count: signed.checkpoint.leaf_count,
            signature: hex::encode(&signed.signature),
            public_key: hex::encode(key.as_bytes()),
        }
    }

    pub fn to_signed(&self) -> Result<SignedCheckpoint, WireError> {
        Ok(SignedCheckpoint {
            checkpoint: Checkpoint {
                root: parse_digest(&self.root)?,
                leaf_count: self.leaf_count,
            },
            signature: hex::decode(&self.signature)?,
        })
    }

    /// Key the server claims to sign with. Only meaningful when compared to a pinned key.
    pub fn public_key(&self) -> Result<VerifyingKey, WireError> {
        parse_verifying_key(&self.public_key)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

pub fn parse_digest(s: &str) -> Result<Hash32, WireError> {
    let bytes = hex::decode(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| WireError::DigestLength(len))
}

pub fn parse_verifying_key(s: &str) -> Result<VerifyingKey, WireError> {
    let bytes = parse_digest(s)?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| WireError::Key(e.to_string()))
}
