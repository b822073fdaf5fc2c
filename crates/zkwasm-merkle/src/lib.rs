//! Binary Merkle tree over SHA-256 column digests.
//!
//! The Stage-1 `MerkleCommitSink` feeds one leaf per encoded column (a
//! running SHA-256 over that column's codeword coefficients). This crate
//! builds the tree from those leaves, returns the root as the Fiat-Shamir
//! seed for Stage 2, and can produce/verify authentication paths for the
//! decommit portion of the proof archive.
//!
//! The decommit *path format itself* is treated as a named collaborator
//! (spec §1): this module gives the prover/verifier a working
//! implementation, not a redesign target.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
pub type Digest32 = [u8; 32];

/// Leaf hash over an arbitrary byte payload (one encoded column's bytes).
#[must_use]
pub fn leaf_hash(bytes: &[u8]) -> Digest32 {
    let mut h = Sha256::new();
    h.update(b"leaf");
    h.update(bytes);
    h.finalize().into()
}

/// Internal node hash combining two children.
#[must_use]
pub fn merkle_parent(a: Digest32, b: Digest32) -> Digest32 {
    let mut h = Sha256::new();
    h.update(b"node");
    h.update(a);
    h.update(b);
    h.finalize().into()
}

/// A full binary Merkle tree, levels stored bottom-up. Odd levels promote
/// their last node unchanged (left-balanced) rather than duplicating it.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest32>>,
}

impl MerkleTree {
    /// Build a tree over the given leaves. Returns a tree with root
    /// `[0u8; 32]` for an empty leaf set.
    #[must_use]
    pub fn build(leaves: Vec<Digest32>) -> Self {
        if leaves.is_empty() {
            return Self {
                levels: vec![vec![[0u8; 32]]],
            };
        }
        let mut levels = vec![leaves];
        while levels.last().expect("levels never empty").len() > 1 {
            let cur = levels.last().expect("levels never empty");
            let mut next = Vec::with_capacity((cur.len() + 1) / 2);
            let mut i = 0;
            while i < cur.len() {
                if i + 1 < cur.len() {
                    next.push(merkle_parent(cur[i], cur[i + 1]));
                } else {
                    next.push(cur[i]);
                }
                i += 2;
            }
            levels.push(next);
        }
        Self { levels }
    }

    /// The Merkle root.
    #[must_use]
    pub fn root(&self) -> Digest32 {
        self.levels.last().expect("levels never empty")[0]
    }

    /// Number of leaves committed.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.levels[0].len()
    }

    /// Authentication path for leaf `idx`: sibling digests from the leaf
    /// level up to (excluding) the root, plus whether each sibling is on the
    /// left or right of the path node.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn authentication_path(&self, idx: usize) -> AuthPath {
        assert!(idx < self.n_leaves(), "leaf index out of range");
        let mut nodes = Vec::new();
        let mut pos = idx;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_pos = pos ^ 1;
            if sibling_pos < level.len() {
                nodes.push(PathNode {
                    digest: level[sibling_pos],
                    sibling_is_right: sibling_pos > pos,
                });
            }
            // odd promotion: no sibling to absorb, node carries forward unchanged
            pos /= 2;
        }
        AuthPath {
            leaf_index: idx,
            nodes,
        }
    }
}

/// One step of an authentication path.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathNode {
    /// Sibling digest at this level.
    pub digest: Digest32,
    /// True when the sibling sits to the right of the current node.
    pub sibling_is_right: bool,
}

/// An authentication path from a leaf to (but not including) the root.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthPath {
    /// Index of the leaf this path authenticates.
    pub leaf_index: usize,
    /// Sibling digests, leaf-to-root order.
    pub nodes: Vec<PathNode>,
}

impl AuthPath {
    /// Recompute the root implied by `leaf` and this path.
    #[must_use]
    pub fn recompute_root(&self, leaf: Digest32) -> Digest32 {
        let mut cur = leaf;
        for node in &self.nodes {
            cur = if node.sibling_is_right {
                merkle_parent(cur, node.digest)
            } else {
                merkle_parent(node.digest, cur)
            };
        }
        cur
    }

    /// Verify this path reproduces `root` given `leaf`.
    #[must_use]
    pub fn verify(&self, leaf: Digest32, root: Digest32) -> bool {
        self.recompute_root(leaf) == root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Digest32> {
        (0..n).map(|i| leaf_hash(&(i as u64).to_le_bytes())).collect()
    }

    #[test]
    fn empty_tree_has_zero_root() {
        assert_eq!(MerkleTree::build(vec![]).root(), [0u8; 32]);
    }

    #[test]
    fn odd_leaf_promotion() {
        let ls = leaves(3);
        let tree = MerkleTree::build(ls.clone());
        let r1 = merkle_parent(ls[0], ls[1]);
        let root = merkle_parent(r1, ls[2]);
        assert_eq!(tree.root(), root);
    }

    #[test]
    fn auth_path_roundtrip_every_leaf() {
        for n in [1usize, 2, 3, 5, 8, 13] {
            let ls = leaves(n);
            let tree = MerkleTree::build(ls.clone());
            for i in 0..n {
                let path = tree.authentication_path(i);
                assert!(path.verify(ls[i], tree.root()), "leaf {i} of {n} failed");
            }
        }
    }
}
