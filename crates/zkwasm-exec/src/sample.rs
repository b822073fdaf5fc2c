//! Fiat-Shamir sample-index derivation shared by Stage 3 and the verifier.
//!
//! Spec §4.E: Stage 3 samples "the pre-chosen sample indices (derived from
//! the Stage 2 root)"; the verifier "re-samples the same indices using the
//! same Fiat-Shamir transform". Both sides call [`derive_sample_indices`]
//! with the same `stage2_seed`, so they always agree without exchanging the
//! index list itself.

use zkwasm_crypto::{Label, Sha256Transcript, Transcript};
use zkwasm_merkle::Digest32;

/// Derive `sample_size` distinct column indices in `0..n` from the Stage-2
/// seed. Draws 8 bytes per candidate and rejects repeats and out-of-range
/// values, re-squeezing under the same label until enough distinct indices
/// are found — deterministic since `Sha256Transcript::challenge_bytes` is a
/// pure function of its absorbed state.
#[must_use]
pub fn derive_sample_indices(seed: Digest32, sample_size: usize, n: usize) -> Vec<usize> {
    assert!(n > 0, "encoding domain must be non-empty");
    let mut transcript = Sha256Transcript::new("zkwasm.sample_indices");
    transcript.absorb(Label::MerkleRoot.as_str(), &seed);

    let mut seen = vec![false; n];
    let mut indices = Vec::with_capacity(sample_size);
    while indices.len() < sample_size.min(n) {
        let bytes = transcript.challenge_bytes(Label::SampleIndex.as_str(), 8);
        let raw = u64::from_le_bytes(bytes.try_into().expect("len 8"));
        let idx = (raw % n as u64) as usize;
        if !seen[idx] {
            seen[idx] = true;
            indices.push(idx);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_distinct() {
        let seed = [7u8; 32];
        let a = derive_sample_indices(seed, 5, 64);
        let b = derive_sample_indices(seed, 5, 64);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), a.len());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = derive_sample_indices([1u8; 32], 5, 64);
        let b = derive_sample_indices([2u8; 32], 5, 64);
        assert_ne!(a, b);
    }

    #[test]
    fn saturates_at_domain_size() {
        let indices = derive_sample_indices([0u8; 32], 100, 4);
        assert_eq!(indices.len(), 4);
    }
}
