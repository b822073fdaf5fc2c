//! Twiddle-factor helpers for power-of-two NTTs.

use crate::domain::Pow2Domain;
use crate::scalar::Scalar;

/// Compute stage twiddles for a length-`n` NTT with primitive `n`-th root
/// `dom.gen`. Returns a vector of length `n/2` where entry `j` is `gen^j`.
#[inline]
#[must_use]
pub fn stage_twiddles(dom: &Pow2Domain) -> Vec<Scalar> {
    let n = dom.size;
    debug_assert!(n.is_power_of_two());
    let mut tw = Vec::with_capacity(n / 2);
    let mut cur = Scalar::one();
    for _ in 0..(n / 2) {
        tw.push(cur);
        cur *= dom.gen;
    }
    tw
}
