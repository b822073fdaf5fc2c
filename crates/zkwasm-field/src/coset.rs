//! Multiplicative cosets of power-of-two subgroup domains.
//!
//! Not exercised by the row encoder itself (which only needs a plain
//! forward NTT), but kept as a building block for callers that want a
//! coset low-degree extension over the same domains.

use crate::ntt::forward_ntt_in_place;
use crate::{domain::Pow2Domain, scalar::Scalar};

/// A multiplicative coset of a power-of-two subgroup domain:
/// `C = shift · ⟨gen⟩`.
#[derive(Clone, Debug)]
pub struct CosetDomain {
    /// Base `2^k` subgroup domain.
    pub base: Pow2Domain,
    /// Shift (coset representative), ideally chosen outside the subgroup.
    pub shift: Scalar,
}

impl CosetDomain {
    /// Number of elements in the coset (same as base).
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.base.size
    }

    /// `i`-th element: `shift * base.element(i)`.
    #[inline]
    #[must_use]
    pub fn element(&self, i: usize) -> Scalar {
        self.shift * self.base.element(i)
    }
}

/// Build a coset from a base domain and an explicit shift.
#[inline]
#[must_use]
pub fn coset_from_pow2(base: Pow2Domain, shift: Scalar) -> CosetDomain {
    CosetDomain { base, shift }
}

/// Evaluate a polynomial (given by coefficients) on a coset of size `2^k`.
#[must_use]
pub fn evaluate_on_coset_pow2(coeffs: &[Scalar], k_log2: usize, shift: Scalar) -> Vec<Scalar> {
    let n = 1usize << k_log2;
    let mut scaled = vec![Scalar::zero(); n];
    let mut pow = Scalar::one();
    let m = coeffs.len().min(n);
    for j in 0..m {
        scaled[j] = coeffs[j] * pow;
        pow *= shift;
    }
    forward_ntt_in_place(&mut scaled);
    scaled
}
