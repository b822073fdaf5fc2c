//! Evaluation-domain helpers over the BN254 scalar field.
//!
//! We construct size-`2^k` multiplicative subgroups using
//! `ark_ff::FftField::get_root_of_unity`, which BN254's `Fr` implements
//! natively (2-adicity 28, far beyond any row size this core will see).

use crate::scalar::Scalar;
use ark_ff::FftField;

/// A power-of-two multiplicative subgroup domain.
#[derive(Clone, Debug)]
pub struct Pow2Domain {
    /// Domain size (`2^k`).
    pub size: usize,
    /// A generator of the size-`size` subgroup.
    pub gen: Scalar,
}

impl Pow2Domain {
    /// Return the `i`-th element: `gen^i`.
    #[inline]
    #[must_use]
    pub fn element(&self, i: usize) -> Scalar {
        self.gen.pow(i as u64)
    }
}

/// Compute a `2^k` domain for the BN254 scalar field.
///
/// # Panics
/// Panics if `k` exceeds the field's 2-adicity.
#[must_use]
pub fn pow2_domain(k: usize) -> Pow2Domain {
    let w = ark_bn254::Fr::get_root_of_unity(1u64 << k)
        .expect("k exceeds BN254 scalar field 2-adicity");
    let gen = Scalar(w);

    debug_assert_eq!(gen.pow(1u64 << k), Scalar::one(), "ω^(2^k) should be 1");
    if k > 0 {
        debug_assert_ne!(
            gen.pow(1u64 << (k - 1)),
            Scalar::one(),
            "ω should have exact order 2^k"
        );
    }

    Pow2Domain {
        size: 1usize << k,
        gen,
    }
}
