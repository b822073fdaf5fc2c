//! Crypto substrate for the Ligero transcript pipeline: a SHA-256-backed
//! domain-separated transcript, plus the canonical label taxonomy shared by
//! the Merkle, reduce, and sample sinks.
//!
//! SHA-256 is the hash mandated by the proof archive format (Merkle root,
//! Stage-2 seed, column digests) rather than a general-purpose XOF, so
//! `challenge_bytes` expands output by hashing the running state against an
//! incrementing counter — a standard hash-based PRF expansion.

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

use sha2::{Digest, Sha256};

/// Fixed domain prefix to seed transcripts.
const TRANSCRIPT_PREFIX: &[u8] = b"zkwasm.transcript.v0";

/// Transcript interface used across the prover/verifier contexts.
///
/// Implementations should apply domain separation for both absorbs and
/// challenges.
pub trait Transcript {
    /// Add raw bytes under a label (domain-separated).
    fn absorb(&mut self, label: &str, bytes: &[u8]);

    /// Convenience: absorb an unsigned 64-bit value (LE).
    fn absorb_u64(&mut self, label: &str, x: u64) {
        self.absorb(label, &x.to_le_bytes());
    }

    /// Convenience: absorb a signed 64-bit value (two's-complement LE).
    fn absorb_i64(&mut self, label: &str, x: i64) {
        self.absorb(label, &x.to_le_bytes());
    }

    /// Squeeze `n` bytes as a challenge under `label`.
    #[must_use]
    fn challenge_bytes(&mut self, label: &str, n: usize) -> Vec<u8>;

    /// Squeeze exactly 32 bytes (a root/seed-shaped challenge).
    #[must_use]
    fn challenge_32(&mut self, label: &str) -> [u8; 32] {
        let v = self.challenge_bytes(label, 32);
        let mut out = [0u8; 32];
        out.copy_from_slice(&v);
        out
    }
}

/// SHA-256-based transcript.
#[derive(Clone, Debug)]
pub struct Sha256Transcript {
    st: Sha256,
}

impl Sha256Transcript {
    /// Create a new transcript with a domain separation prefix.
    #[must_use]
    pub fn new(domain_sep: &str) -> Self {
        let mut st = Sha256::new();
        st.update(TRANSCRIPT_PREFIX);
        st.update((domain_sep.len() as u32).to_le_bytes());
        st.update(domain_sep.as_bytes());
        Self { st }
    }

    fn absorb_tagged(&mut self, tag: &[u8], label: &str, bytes: &[u8]) {
        self.st.update(tag);
        self.st.update((label.len() as u32).to_le_bytes());
        self.st.update(label.as_bytes());
        self.st.update((bytes.len() as u32).to_le_bytes());
        self.st.update(bytes);
    }
}

impl Transcript for Sha256Transcript {
    fn absorb(&mut self, label: &str, bytes: &[u8]) {
        self.absorb_tagged(b"absorb", label, bytes);
    }

    fn challenge_bytes(&mut self, label: &str, n: usize) -> Vec<u8> {
        let base = self.st.clone().finalize();

        let mut out = Vec::with_capacity(n);
        let mut counter: u32 = 0;
        while out.len() < n {
            let mut h = Sha256::new();
            h.update(b"challenge");
            h.update((label.len() as u32).to_le_bytes());
            h.update(label.as_bytes());
            h.update(base);
            h.update(counter.to_le_bytes());
            let digest = h.finalize();
            let take = (n - out.len()).min(digest.len());
            out.extend_from_slice(&digest[..take]);
            counter += 1;
        }

        self.absorb_tagged(b"after_challenge", label, &[]);
        out
    }
}

/// Canonical transcript labels used across the three prover stages and the
/// verifier, avoiding stringly-typed mistakes in domain separation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Label {
    /// Global parameter absorption (row_size, sample_size, modulus, ...).
    Params,
    /// Column digest absorption (Stage 1 Merkle leaves).
    ColRoot,
    /// Stage-1 Merkle root absorption, seeding Stage 2.
    MerkleRoot,
    /// Stage-2 aggregate absorption (code/linear/quadratic codewords).
    Aggregate,
    /// Sample-index derivation from the Stage-2 seed.
    SampleIndex,
    /// Row-opening absorption (Merkle decommit path).
    RowOpen,
}

impl Label {
    /// Borrow the canonical string.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Params => "zkwasm/params",
            Label::ColRoot => "zkwasm/col_root",
            Label::MerkleRoot => "zkwasm/merkle_root",
            Label::Aggregate => "zkwasm/aggregate",
            Label::SampleIndex => "zkwasm/sample_index",
            Label::RowOpen => "zkwasm/row_open",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Sha256Transcript, Transcript};

    #[test]
    fn determinism_and_label_sep() {
        let mut t1 = Sha256Transcript::new("dom");
        let mut t2 = Sha256Transcript::new("dom");

        t1.absorb("a", b"hello");
        t2.absorb("a", b"hello");

        assert_eq!(t1.challenge_bytes("c", 32), t2.challenge_bytes("c", 32));

        let mut t3 = Sha256Transcript::new("dom");
        t3.absorb("a", b"hello");
        assert_ne!(t1.challenge_bytes("c", 32), t3.challenge_bytes("d", 32));
    }

    #[test]
    fn domain_separation_changes_output() {
        let mut t1 = Sha256Transcript::new("dom1");
        let mut t2 = Sha256Transcript::new("dom2");
        t1.absorb("x", b"payload");
        t2.absorb("x", b"payload");
        assert_ne!(t1.challenge_bytes("c", 16), t2.challenge_bytes("c", 16));
    }

    #[test]
    fn long_challenge_expands_deterministically() {
        let mut t1 = Sha256Transcript::new("dom");
        let mut t2 = Sha256Transcript::new("dom");
        t1.absorb("a", b"x");
        t2.absorb("a", b"x");
        assert_eq!(t1.challenge_bytes("c", 130), t2.challenge_bytes("c", 130));
    }
}
