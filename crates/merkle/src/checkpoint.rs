//! Signed tree roots

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{Checkpoint, MerkleError, Result};

/// Checkpoint plus an ed25519 signature over its bincode encoding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCheckpoint {
    pub checkpoint: Checkpoint,
    pub signature: Vec<u8>,
}

impl SignedCheckpoint {
    pub fn verify(&self, key: &VerifyingKey) -> bool {
        let message = match encode(&self.checkpoint) {
            Ok(m) => m,
            Err(_) => return false,
        };
        let sig = match Signature::from_slice(&self.signature) {
            Ok(s) => s,
            Err(_) => return false,
        };
        key.verify(&message, &sig).is_ok()
    }
}

pub struct CheckpointSigner {
    signing_key: SigningKey,
}

impl CheckpointSigner {
    /// Fresh key from the OS RNG
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn sign(&self, checkpoint: Checkpoint) -> Result<SignedCheckpoint> {
        let message = encode(&checkpoint)?;
        let signature = self.signing_key.sign(&message);
        Ok(SignedCheckpoint {
            checkpoint,
            signature: signature.to_bytes().to_vec(),
        })
    }
}

fn encode(checkpoint: &Checkpoint) -> Result<Vec<u8>> {
    bincode::serialize(checkpoint).map_err(|e| MerkleError::Serialization(e.to_string()))
}
