//! Client-side proof verification

use crate::crypto::{self, Hasher, Sha256Hasher};
use crate::{Hash32, MerkleProof};

/// Recompute a root from `content` and `proof` and compare it with `trusted_root`.
///
/// The leaf digest is always derived from the content itself; nothing the
/// server claims about the leaf is consulted.
pub fn verify_proof_with<H: Hasher>(
    content: &[u8],
    proof: &MerkleProof,
    trusted_root: &Hash32,
) -> bool {
    let computed = proof
        .siblings
        .iter()
        .fold(crypto::hash_content::<H>(content), |running, sibling| {
            crypto::combine::<H>(&running, sibling)
        });
    computed == *trusted_root
}

/// [`verify_proof_with`] over SHA-256
pub fn verify_proof(content: &[u8], proof: &MerkleProof, trusted_root: &Hash32) -> bool {
    verify_proof_with::<Sha256Hasher>(content, proof, trusted_root)
}
