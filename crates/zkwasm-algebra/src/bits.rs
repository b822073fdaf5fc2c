//! Bit decomposition/composition and Euclidean division.
//!
//! Grounded on `core.hpp`'s `bit_decompose`/`bit_decompose_constant`/
//! `bit_compose`/`bit_compose_constant`/`idivide_qr`. Each produced bit is
//! constrained boolean (`constrain_bit`) and tied back to the decomposed
//! value through the same random-linear-check mechanism as every other
//! constraint here: one shared challenge, accumulated bit-by-bit with
//! doubling weights, checked against the source witness in one shot.
//!
//! `core.hpp`'s `decomposed_bits` destructs its members in reverse (MSB-first)
//! order so that `drop_lsb`/`drop_msb` can partially consume a decomposition
//! mid-lifetime without upsetting the rest. Rust's `Drop` can't take the
//! `&mut WitnessManager` it would need to release anything, so that
//! RAII-on-scope-exit is replaced here with the explicit
//! [`DecomposedBits::drop_lsb`]/[`DecomposedBits::drop_msb`]/
//! [`DecomposedBits::release_all`] calls a caller must make once it is done
//! with some or all of the bits.

use zkwasm_field::Scalar;
use zkwasm_witness::{WitnessId, WitnessManager};

/// A little-endian vector of boolean witnesses produced by
/// [`bit_decompose`]/[`bit_decompose_constant`]. Bit 0 is the least
/// significant.
#[derive(Debug, Default)]
pub struct DecomposedBits {
    bits: Vec<WitnessId>,
}

impl DecomposedBits {
    /// Wrap an already-materialized, already-constrained sequence of
    /// boolean witnesses (e.g. the output of a per-bit combinator) so it can
    /// be recomposed or partially dropped like any other decomposition.
    #[must_use]
    pub fn from_bits(bits: Vec<WitnessId>) -> Self {
        Self { bits }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[must_use]
    pub fn get(&self, i: usize) -> WitnessId {
        self.bits[i]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[WitnessId] {
        &self.bits
    }

    /// Release and drop the `n` least-significant bits.
    pub fn drop_lsb(&mut self, mgr: &mut WitnessManager, n: usize) {
        for &id in self.bits[..n].iter().rev() {
            mgr.release(id);
        }
        self.bits.drain(..n);
    }

    /// Release and drop the `n` most-significant bits.
    pub fn drop_msb(&mut self, mgr: &mut WitnessManager, n: usize) {
        for _ in 0..n {
            if let Some(id) = self.bits.pop() {
                mgr.release(id);
            }
        }
    }

    /// Release every remaining bit.
    pub fn release_all(&mut self, mgr: &mut WitnessManager) {
        while let Some(id) = self.bits.pop() {
            mgr.release(id);
        }
    }
}

/// Decompose witness `x` into `width` boolean witnesses, constrained so the
/// doubling-weighted sum of bit randoms cancels `x`'s own random term.
pub fn bit_decompose(mgr: &mut WitnessManager, x: WitnessId, width: u32) -> DecomposedBits {
    let value = mgr.value_of(x);
    let rand = mgr.next_linear_random();
    mgr.witness_sub_random(x, rand);

    let mut bits = Vec::with_capacity(width as usize);
    let mut weight = rand;
    for i in 0..width {
        let bit_val = if value.bit(i) { Scalar::one() } else { Scalar::zero() };
        let w = mgr.acquire_witness(bit_val);
        mgr.constrain_bit(w);
        mgr.witness_add_random(w, weight);
        bits.push(w);
        weight += weight;
    }
    DecomposedBits { bits }
}

/// Decompose a compile-time constant into `width` boolean witnesses, each
/// tied to its known value via `constrain_constant` (no shared witness to
/// reconcile against, unlike [`bit_decompose`]).
pub fn bit_decompose_constant(mgr: &mut WitnessManager, k: Scalar, width: u32) -> DecomposedBits {
    let mut bits = Vec::with_capacity(width as usize);
    for i in 0..width {
        let bit_val = if k.bit(i) { Scalar::one() } else { Scalar::zero() };
        let w = mgr.acquire_witness(bit_val);
        mgr.constrain_constant(w, bit_val);
        bits.push(w);
    }
    DecomposedBits { bits }
}

/// Recompose `bits` into a single witness equal to their doubling-weighted
/// sum, consuming none of the bit witnesses (the caller still owns them and
/// must eventually release them, e.g. via [`DecomposedBits::release_all`]).
pub fn bit_compose(mgr: &mut WitnessManager, bits: &DecomposedBits) -> WitnessId {
    let wit = mgr.acquire_witness(Scalar::zero());
    let rand = mgr.next_linear_random();
    mgr.witness_sub_random(wit, rand);

    let mut sum = Scalar::zero();
    let mut weight = Scalar::one();
    let mut rweight = rand;
    for &b in bits.as_slice() {
        sum += mgr.value_of(b) * weight;
        mgr.witness_add_random(b, rweight);
        weight += weight;
        rweight += rweight;
    }
    mgr.set_value(wit, sum);
    wit
}

/// Recompose `bits` into a plain `Scalar`, with no constraint at all — used
/// when every bit is itself a compile-time constant and no fresh witness is
/// needed.
#[must_use]
pub fn bit_compose_constant(mgr: &WitnessManager, bits: &DecomposedBits) -> Scalar {
    let mut sum = Scalar::zero();
    let mut weight = Scalar::one();
    for &b in bits.as_slice() {
        sum += mgr.value_of(b) * weight;
        weight += weight;
    }
    sum
}

/// Euclidean quotient/remainder of `x` by `y`, constrained by `q*y + r == x`
/// through a fresh quadratic group, with `0 ≤ r < y` asserted via
/// bit-decomposition and [`crate::bitwise::bitwise_gt`] — a malicious prover
/// could otherwise supply any `(q, r)` pair satisfying the quadratic
/// relation alone, with `r` unbounded.
///
/// `width` is the bit width both `y` and `r` are decomposed to for the
/// range check.
///
/// # Panics
/// Panics if `y`'s current value is zero.
pub fn idivide_qr(mgr: &mut WitnessManager, x: WitnessId, y: WitnessId, width: u32) -> (WitnessId, WitnessId) {
    let xv = mgr.value_of(x);
    let yv = mgr.value_of(y);
    let (qv, rv) = xv.idiv_rem(yv);

    let q = mgr.acquire_witness(qv);
    let r = mgr.acquire_witness(rv);

    let prod = mgr.acquire_witness(qv * yv);
    mgr.constrain_quadratic(prod, q, y);
    mgr.constrain_linear(x, prod, r);

    let mut y_bits = bit_decompose(mgr, y, width);
    let mut r_bits = bit_decompose(mgr, r, width);
    let in_range = crate::bitwise::bitwise_gt(mgr, &y_bits, &r_bits);
    mgr.constrain_constant(in_range, Scalar::one());
    mgr.release(in_range);
    y_bits.release_all(mgr);
    r_bits.release_all(mgr);

    (q, r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mgr() -> WitnessManager {
        WitnessManager::new(16, 32, [11u8; 32])
    }

    #[test]
    fn decompose_then_compose_roundtrips() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(0b1011));
        let mut bits = bit_decompose(&mut mgr, x, 4);
        assert_eq!(bits.len(), 4);
        let recomposed = bit_compose(&mut mgr, &bits);
        assert_eq!(mgr.value_of(recomposed), Scalar::from_u64(0b1011));
        mgr.release(x);
        mgr.release(recomposed);
        bits.release_all(&mut mgr);
        mgr.finalize();
    }

    #[test]
    fn constant_decompose_matches_bit_pattern() {
        let mut mgr = mgr();
        let mut bits = bit_decompose_constant(&mut mgr, Scalar::from_u64(0b0101), 4);
        assert!(mgr.value_of(bits.get(0)) == Scalar::one());
        assert!(mgr.value_of(bits.get(1)) == Scalar::zero());
        assert!(mgr.value_of(bits.get(2)) == Scalar::one());
        assert!(mgr.value_of(bits.get(3)) == Scalar::zero());
        bits.release_all(&mut mgr);
        mgr.finalize();
    }

    #[test]
    fn idivide_qr_matches_euclidean_division() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(17));
        let y = mgr.acquire_witness(Scalar::from_u64(5));
        let (q, r) = idivide_qr(&mut mgr, x, y, 8);
        assert_eq!(mgr.value_of(q), Scalar::from_u64(3));
        assert_eq!(mgr.value_of(r), Scalar::from_u64(2));
        mgr.release(x);
        mgr.release(y);
        mgr.release(q);
        mgr.release(r);
        mgr.finalize();
    }

    #[test]
    fn drop_lsb_releases_only_low_bits() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(0b1010));
        let mut bits = bit_decompose(&mut mgr, x, 4);
        bits.drop_lsb(&mut mgr, 2);
        assert_eq!(bits.len(), 2);
        mgr.release(x);
        bits.release_all(&mut mgr);
        mgr.finalize();
    }
}
