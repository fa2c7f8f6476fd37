//! Insertion-ordered ledger of leaf digests

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::crypto::{self, Hasher, Sha256Hasher};
use crate::{Hash32, Leaf, MerkleError, Result};

/// Append-only sequence of leaves.
///
/// Lookup by digest returns the first position holding it, so duplicate
/// content resolves to its earliest upload.
#[derive(Clone, Debug)]
pub struct LeafStore<H: Hasher = Sha256Hasher> {
    leaves: Vec<Leaf>,
    first_seen: HashMap<Hash32, usize>,
    _hasher: PhantomData<H>,
}

impl<H: Hasher> Default for LeafStore<H> {
    fn default() -> Self {
        Self {
            leaves: Vec::new(),
            first_seen: HashMap::new(),
            _hasher: PhantomData,
        }
    }
}

impl LeafStore<Sha256Hasher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: Hasher> LeafStore<H> {
    /// Rebuild a store from digests in their original insertion order
    pub fn from_digests<I: IntoIterator<Item = Hash32>>(digests: I) -> Self {
        let mut store = Self::default();
        for digest in digests {
            store.append_digest(digest);
        }
        store
    }

    /// Hash `content` and append it as a new leaf
    pub fn append(&mut self, content: &[u8]) -> usize {
        self.append_digest(crypto::hash_content::<H>(content))
    }

    pub fn append_digest(&mut self, digest: Hash32) -> usize {
        let position = self.leaves.len();
        self.leaves.push(Leaf { digest, position });
        self.first_seen.entry(digest).or_insert(position);
        position
    }

    pub fn position_of(&self, content: &[u8]) -> Result<usize> {
        self.position_of_digest(&crypto::hash_content::<H>(content))
    }

    pub fn position_of_digest(&self, digest: &Hash32) -> Result<usize> {
        self.first_seen.get(digest).copied().ok_or(MerkleError::NotFound)
    }

    pub fn get(&self, position: usize) -> Option<&Leaf> {
        self.leaves.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Leaf> {
        self.leaves.iter()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_insertion_order() {
        let mut store = LeafStore::new();
        assert_eq!(store.append(b"a"), 0);
        assert_eq!(store.append(b"b"), 1);
        assert_eq!(store.append(b"a"), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(2).map(|l| l.position), Some(2));
    }

    #[test]
    fn duplicate_content_resolves_to_first_position() {
        let mut store = LeafStore::new();
        store.append(b"x");
        store.append(b"dup");
        store.append(b"dup");
        assert_eq!(store.position_of(b"dup").unwrap(), 1);
        assert_eq!(store.get(1).unwrap().digest, store.get(2).unwrap().digest);
    }

    #[test]
    fn unknown_content_is_not_found() {
        let mut store = LeafStore::new();
        store.append(b"present");
        assert!(matches!(store.position_of(b"absent"), Err(MerkleError::NotFound)));
    }

    #[test]
    fn from_digests_keeps_order() {
        let mut original = LeafStore::new();
        let contents: [&[u8]; 3] = [b"one", b"two", b"three"];
        for c in contents {
            original.append(c);
        }
        let restored = LeafStore::<Sha256Hasher>::from_digests(original.iter().map(|l| l.digest));
        let a: Vec<_> = original.iter().copied().collect();
        let b: Vec<_> = restored.iter().copied().collect();
        assert_eq!(a, b);
    }
}
