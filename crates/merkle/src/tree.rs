//! Arena-backed binary hash tree with proof generation.

use tracing::debug;

use crate::crypto::{self, Hasher, Sha256Hasher};
use crate::leaves::LeafStore;
use crate::{Checkpoint, Hash32, MerkleError, MerkleProof, Result};

/// Index of a node in the tree arena
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Clone, Debug)]
struct Node {
    digest: Hash32,
    left: Option<NodeId>,
    right: Option<NodeId>,
    /// Back-link used only for walking proofs
    parent: Option<NodeId>,
}

impl Node {
    fn leaf(digest: Hash32) -> Self {
        Self {
            digest,
            left: None,
            right: None,
            parent: None,
        }
    }
}

/// Binary hash tree over an append-only leaf ledger.
///
/// Nodes live in an arena; slots `0..leaf_count` are the leaves in position
/// order and every later slot is an internal node. The arena is rebuilt from
/// scratch after every append.
#[derive(Clone, Debug)]
pub struct MerkleTree<H: Hasher = Sha256Hasher> {
    leaves: LeafStore<H>,
    nodes: Vec<Node>,
    root: Option<NodeId>,
    height: usize,
}

impl<H: Hasher> Default for MerkleTree<H> {
    fn default() -> Self {
        Self {
            leaves: LeafStore::default(),
            nodes: Vec::new(),
            root: None,
            height: 0,
        }
    }
}

impl MerkleTree<Sha256Hasher> {
    /// Empty SHA-256 tree
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: Hasher> MerkleTree<H> {
    /// Empty tree over a caller-chosen digest
    pub fn with_hasher() -> Self {
        Self::default()
    }

    /// Reconstruct a tree from leaf digests in insertion order
    pub fn from_digests<I: IntoIterator<Item = Hash32>>(digests: I) -> Self {
        let mut tree = Self {
            leaves: LeafStore::from_digests(digests),
            ..Self::default()
        };
        if !tree.leaves.is_empty() {
            tree.relink();
        }
        tree
    }

    /// Append one content blob and rebuild. Returns the new leaf position.
    pub fn append(&mut self, content: &[u8]) -> Result<usize> {
        let position = self.leaves.append(content);
        self.rebuild()?;
        Ok(position)
    }

    pub fn append_digest(&mut self, digest: Hash32) -> Result<usize> {
        let position = self.leaves.append_digest(digest);
        self.rebuild()?;
        Ok(position)
    }

    /// Append several blobs, rebuilding once at the end
    pub fn add_leaves<I, T>(&mut self, contents: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for content in contents {
            self.leaves.append(content.as_ref());
        }
        self.rebuild()
    }

    /// Discard every internal node and derive the tree again from the leaves.
    pub fn rebuild(&mut self) -> Result<()> {
        if self.leaves.is_empty() {
            self.nodes.clear();
            self.root = None;
            self.height = 0;
            return Err(MerkleError::EmptyTree);
        }
        self.relink();
        Ok(())
    }

    fn relink(&mut self) {
        let mut nodes: Vec<Node> = Vec::with_capacity(2 * self.leaves.len());
        nodes.extend(self.leaves.iter().map(|leaf| Node::leaf(leaf.digest)));

        let mut level: Vec<NodeId> = (0..nodes.len()).map(NodeId).collect();
        let mut height = 0;

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                let left = pair[0];
                // odd tail is paired with itself
                let right = pair.get(1).copied().unwrap_or(left);

                let digest = crypto::combine::<H>(&nodes[left.0].digest, &nodes[right.0].digest);
                let parent = NodeId(nodes.len());
                nodes.push(Node {
                    digest,
                    left: Some(left),
                    right: Some(right),
                    parent: None,
                });
                nodes[left.0].parent = Some(parent);
                nodes[right.0].parent = Some(parent);
                next.push(parent);
            }
            level = next;
            height += 1;
        }

        self.nodes = nodes;
        self.root = level.first().copied();
        self.height = height;

        if let Some(root) = self.root {
            debug!(
                leaf_count = self.leaves.len(),
                height,
                root = %hex::encode(self.nodes[root.0].digest),
                "tree rebuilt"
            );
        }
    }

    pub fn root(&self) -> Result<Hash32> {
        self.root
            .map(|id| self.nodes[id.0].digest)
            .ok_or(MerkleError::EmptyTree)
    }

    pub fn checkpoint(&self) -> Result<Checkpoint> {
        Ok(Checkpoint {
            root: self.root()?,
            leaf_count: self.leaves.len() as u64,
        })
    }

    /// Sibling digests from the leaf at `position` up to the root
    pub fn generate_proof(&self, position: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaves.len();
        if position >= leaf_count {
            return Err(MerkleError::InvalidPosition {
                position,
                leaf_count,
            });
        }

        let mut siblings = Vec::with_capacity(self.height);
        let mut current = NodeId(position);
        while let Some(parent) = self.nodes[current.0].parent {
            let sibling = self.sibling(current, parent);
            siblings.push(self.nodes[sibling.0].digest);
            current = parent;
        }

        Ok(MerkleProof { siblings })
    }

    fn sibling(&self, node: NodeId, parent: NodeId) -> NodeId {
        let p = &self.nodes[parent.0];
        // a self-paired node has itself on both sides
        if p.left == Some(node) {
            p.right.unwrap_or(node)
        } else {
            p.left.unwrap_or(node)
        }
    }

    pub fn position_of(&self, content: &[u8]) -> Result<usize> {
        self.leaves.position_of(content)
    }

    pub fn leaves(&self) -> &LeafStore<H> {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of levels above the leaves; also the length of every proof
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{combine, hash_content};

    fn h(content: &[u8]) -> Hash32 {
        hash_content::<Sha256Hasher>(content)
    }

    #[test]
    fn empty_tree_has_no_root() {
        let mut tree = MerkleTree::new();
        assert!(matches!(tree.root(), Err(MerkleError::EmptyTree)));
        assert!(matches!(tree.rebuild(), Err(MerkleError::EmptyTree)));
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn single_leaf_is_the_root() {
        let mut tree = MerkleTree::new();
        tree.append(b"only").unwrap();
        assert_eq!(tree.root().unwrap(), h(b"only"));
        assert_eq!(tree.height(), 0);
        assert!(tree.generate_proof(0).unwrap().is_empty());
    }

    #[test]
    fn four_leaves_root_matches_manual_fold() {
        let mut tree = MerkleTree::new();
        tree.add_leaves([b"a", b"b", b"c", b"d"]).unwrap();

        let ab = combine::<Sha256Hasher>(&h(b"a"), &h(b"b"));
        let cd = combine::<Sha256Hasher>(&h(b"c"), &h(b"d"));
        assert_eq!(tree.root().unwrap(), combine::<Sha256Hasher>(&ab, &cd));
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn odd_tail_is_paired_with_itself() {
        let mut tree = MerkleTree::new();
        tree.add_leaves([b"a", b"b", b"c"]).unwrap();

        let c = h(b"c");
        let ab = combine::<Sha256Hasher>(&h(b"a"), &h(b"b"));
        let cc = combine::<Sha256Hasher>(&c, &c);
        assert_eq!(tree.root().unwrap(), combine::<Sha256Hasher>(&ab, &cc));

        let proof = tree.generate_proof(2).unwrap();
        assert_eq!(proof.siblings, vec![c, ab]);
    }

    #[test]
    fn parent_links_point_at_internal_nodes() {
        let mut tree = MerkleTree::new();
        tree.add_leaves([b"a", b"b", b"c", b"d", b"e"]).unwrap();

        let leaf_count = tree.leaf_count();
        for leaf in 0..leaf_count {
            let parent = tree.nodes[leaf].parent.expect("leaf has a parent");
            assert!(parent.0 >= leaf_count);
            let p = &tree.nodes[parent.0];
            assert!(p.left == Some(NodeId(leaf)) || p.right == Some(NodeId(leaf)));
        }
        let root = tree.root.unwrap();
        assert!(tree.nodes[root.0].parent.is_none());
    }

    #[test]
    fn proof_out_of_range_is_rejected() {
        let mut tree = MerkleTree::new();
        tree.add_leaves([b"a", b"b"]).unwrap();
        match tree.generate_proof(2) {
            Err(MerkleError::InvalidPosition {
                position,
                leaf_count,
            }) => {
                assert_eq!((position, leaf_count), (2, 2));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn from_digests_reproduces_root() {
        let mut tree = MerkleTree::new();
        tree.add_leaves([b"1", b"2", b"3", b"4", b"5", b"6", b"7"]).unwrap();

        let digests = tree.leaves().iter().map(|l| l.digest);
        let restored = MerkleTree::<Sha256Hasher>::from_digests(digests);
        assert_eq!(restored.root().unwrap(), tree.root().unwrap());
        assert_eq!(restored.height(), tree.height());
    }

    #[test]
    fn from_no_digests_is_empty() {
        let tree = MerkleTree::<Sha256Hasher>::from_digests(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.root().is_err());
    }
}
