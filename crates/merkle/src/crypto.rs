//! Digest function and the canonical pairing rule

use crate::Hash32;
use sha2::{Digest as _, Sha256};

/// A fixed-width digest function.
///
/// Implementations are zero-sized markers so a tree's hash function is
/// part of its type rather than runtime state.
pub trait Hasher: Send + Sync + 'static {
    fn hash(data: &[u8]) -> Hash32;
}

/// SHA-256, the default digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(data: &[u8]) -> Hash32 {
        Sha256::digest(data).into()
    }
}

/// BLAKE3 with its standard 32-byte output.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    fn hash(data: &[u8]) -> Hash32 {
        blake3::hash(data).into()
    }
}

/// Leaf digest of a content blob
pub fn hash_content<H: Hasher>(content: &[u8]) -> Hash32 {
    H::hash(content)
}

/// Parent digest of two children.
/// node = H(min(a, b) || max(a, b)), so combine(a, b) == combine(b, a).
pub fn combine<H: Hasher>(a: &Hash32, b: &Hash32) -> Hash32 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(first);
    data[32..].copy_from_slice(second);
    H::hash(&data)
}
