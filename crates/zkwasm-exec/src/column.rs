//! The column-wise SHA-256 accumulator shared by Stage 1 and Stage 3.
//!
//! Spec §4.A's `MerkleCommitSink` hashes each encoded column (one
//! coefficient per emitted row, at a fixed column index) into a single
//! leaf, then builds a [`zkwasm_merkle::MerkleTree`] over the `encoding_size`
//! leaves. Replaying the same row order with the same master seed (the
//! row-ordering invariant, spec §3) makes this reproducible stage to stage,
//! which is how Stage 3 can independently rebuild the tree it needs
//! authentication paths from without any state threaded over from Stage 1.

use sha2::{Digest, Sha256};
use zkwasm_field::Scalar;
use zkwasm_merkle::{Digest32, MerkleTree};

/// One running SHA-256 hasher per encoded column, pre-seeded with
/// [`zkwasm_merkle::leaf_hash`]'s `b"leaf"` domain tag so `finish` produces
/// exactly the leaf `leaf_hash` would over that column's full byte string.
pub struct ColumnHasher {
    hashers: Vec<Sha256>,
}

impl ColumnHasher {
    /// One hasher per column of an `n`-wide encoding domain.
    #[must_use]
    pub fn new(n: usize) -> Self {
        let hashers = (0..n)
            .map(|_| {
                let mut h = Sha256::new();
                h.update(b"leaf");
                h
            })
            .collect();
        Self { hashers }
    }

    /// Absorb one encoded row (length must equal the hasher count).
    pub fn absorb_row(&mut self, codeword: &[Scalar]) {
        debug_assert_eq!(codeword.len(), self.hashers.len());
        for (h, x) in self.hashers.iter_mut().zip(codeword) {
            h.update(x.to_le_bytes());
        }
    }

    /// Finalize every column hasher into its leaf digest, in column order.
    #[must_use]
    pub fn into_leaves(self) -> Vec<Digest32> {
        self.hashers.into_iter().map(|h| h.finalize().into()).collect()
    }

    /// Finalize and build the Merkle tree over the resulting leaves.
    #[must_use]
    pub fn into_tree(self) -> MerkleTree {
        MerkleTree::build(self.into_leaves())
    }
}
