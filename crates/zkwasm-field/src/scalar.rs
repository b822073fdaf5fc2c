//! BN254 scalar field element with integer-representative operations.
//!
//! The Ligero transcript is built over the BN254 scalar field (order
//! `p ≈ 2^254`). Besides the usual field ring operations, the interpreter
//! needs to treat a field element's canonical representative as a plain
//! unsigned integer: bitwise and/or/xor/not, shifts, and Euclidean
//! division/remainder. Those live here rather than on `ark_bn254::Fr`
//! directly so callers get a single, small surface.

#![allow(clippy::similar_names)]

use ark_ff::{BigInteger, BigInteger256, Field, PrimeField, UniformRand, Zero};
use num_bigint::BigUint;
use rand::RngCore;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A BN254 scalar field element.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash)]
pub struct Scalar(pub ark_bn254::Fr);

impl Scalar {
    /// The additive identity.
    #[must_use]
    pub fn zero() -> Self {
        Self(ark_bn254::Fr::from(0u64))
    }

    /// The multiplicative identity.
    #[must_use]
    pub fn one() -> Self {
        Self(ark_bn254::Fr::from(1u64))
    }

    /// Reduce a `u64` into the field.
    #[must_use]
    pub fn from_u64(x: u64) -> Self {
        Self(ark_bn254::Fr::from(x))
    }

    /// Reduce an `i64` into the field, mapping negative values to `p - |x|`.
    #[must_use]
    pub fn from_i64(x: i64) -> Self {
        if x >= 0 {
            Self::from_u64(x as u64)
        } else {
            -Self::from_u64(x.unsigned_abs())
        }
    }

    /// Build from an arbitrary-width big-endian byte string, reducing mod `p`.
    #[must_use]
    pub fn from_be_bytes_reduce(bytes: &[u8]) -> Self {
        let n = BigUint::from_bytes_be(bytes);
        Self::from_biguint(&n)
    }

    fn from_biguint(n: &BigUint) -> Self {
        let modulus = Self::modulus_biguint();
        let reduced = n % &modulus;
        Self::from_biguint_unreduced(&reduced)
    }

    fn from_biguint_unreduced(n: &BigUint) -> Self {
        let mut digits = n.to_u64_digits();
        digits.resize(4, 0);
        let limbs: [u64; 4] = [digits[0], digits[1], digits[2], digits[3]];
        Self(ark_bn254::Fr::from_bigint(BigInteger256::new(limbs)).expect("reduced value fits"))
    }

    fn modulus_biguint() -> BigUint {
        BigUint::from_bytes_le(&<ark_bn254::Fr as PrimeField>::MODULUS.to_bytes_le())
    }

    /// Canonical representative as a little-endian `BigInteger256`.
    #[must_use]
    pub fn to_bigint(self) -> BigInteger256 {
        self.0.into_bigint()
    }

    /// Canonical representative as a `BigUint`, for bit/div operations.
    #[must_use]
    pub fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_le(&self.to_bigint().to_bytes_le())
    }

    /// `⌊p/2⌋`: the line that partitions the field into "positive" and
    /// "negative" halves when interpreting representatives as signed values.
    #[must_use]
    pub fn modulus_middle() -> BigUint {
        Self::modulus_biguint() / BigUint::from(2u8)
    }

    /// True when this element's representative lies in the "negative" half.
    #[must_use]
    pub fn is_negative_repr(self) -> bool {
        self.to_biguint() > Self::modulus_middle()
    }

    /// Multiplicative inverse. Panics on zero, matching field-arithmetic
    /// conventions elsewhere in the backend (callers never invert a witness
    /// known to be zero).
    #[must_use]
    pub fn inv(self) -> Self {
        Self(self.0.inverse().expect("inverse of zero"))
    }

    /// Exponentiation by an unsigned exponent.
    #[must_use]
    pub fn pow(self, e: u64) -> Self {
        Self(self.0.pow([e]))
    }

    /// Additive inverse.
    #[must_use]
    pub fn neg(self) -> Self {
        Self(-self.0)
    }

    /// Bitwise AND of the two canonical representatives.
    #[must_use]
    pub fn bitand(self, rhs: Self) -> Self {
        Self::from_biguint_unreduced(&(self.to_biguint() & rhs.to_biguint()))
    }

    /// Bitwise OR of the two canonical representatives.
    #[must_use]
    pub fn bitor(self, rhs: Self) -> Self {
        Self::from_biguint_unreduced(&(self.to_biguint() | rhs.to_biguint()))
    }

    /// Bitwise XOR of the two canonical representatives.
    #[must_use]
    pub fn bitxor(self, rhs: Self) -> Self {
        Self::from_biguint_unreduced(&(self.to_biguint() ^ rhs.to_biguint()))
    }

    /// Bitwise NOT of the representative within a fixed bit width `w`:
    /// `(2^w - 1) - x`. General (width-less) NOT is not meaningful on a
    /// residue, so every caller must supply the width of the value it holds.
    #[must_use]
    pub fn bitnot(self, width: u32) -> Self {
        let mask = (BigUint::from(1u8) << width) - BigUint::from(1u8);
        Self::from_biguint_unreduced(&(mask ^ self.to_biguint()))
    }

    /// Left shift with reduction mod `p`.
    #[must_use]
    pub fn shl_mod(self, n: u32) -> Self {
        Self::from_biguint(&(self.to_biguint() << n))
    }

    /// Logical right shift of the representative (no modular reduction
    /// needed since the result is never larger than the input).
    #[must_use]
    pub fn shr(self, n: u32) -> Self {
        Self::from_biguint_unreduced(&(self.to_biguint() >> n))
    }

    /// Euclidean division/remainder of the two canonical representatives,
    /// i.e. of the *integers*, not a field division. Used by the algebraic
    /// backend's `idivide_qr`.
    ///
    /// # Panics
    /// Panics if `rhs` is zero.
    #[must_use]
    pub fn idiv_rem(self, rhs: Self) -> (Self, Self) {
        let a = self.to_biguint();
        let b = rhs.to_biguint();
        assert!(!b.is_zero(), "idiv_rem by zero");
        let q = &a / &b;
        let r = &a % &b;
        (Self::from_biguint_unreduced(&q), Self::from_biguint_unreduced(&r))
    }

    /// Returns true if the canonical representative is strictly less than
    /// that of `rhs`, comparing as unsigned integers.
    #[must_use]
    pub fn lt_unsigned(self, rhs: Self) -> bool {
        self.to_biguint() < rhs.to_biguint()
    }

    /// Little-endian byte serialization, field-width (32 bytes).
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = self.to_bigint().to_bytes_le();
        out[..bytes.len()].copy_from_slice(&bytes);
        out
    }

    /// Sample a uniformly random field element from an RNG.
    pub fn random(rng: &mut impl RngCore) -> Self {
        Self(ark_bn254::Fr::rand(rng))
    }

    /// Inverse of [`Scalar::to_le_bytes`]: reduce a 32-byte little-endian
    /// limb string mod `p`.
    #[must_use]
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_biguint(&BigUint::from_bytes_le(bytes))
    }

    /// Test bit `i` of the canonical representative (0 = LSB).
    #[must_use]
    pub fn bit(self, i: u32) -> bool {
        self.to_biguint().bit(u64::from(i))
    }
}

impl Add for Scalar {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}
impl Sub for Scalar {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}
impl Mul for Scalar {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}
impl AddAssign for Scalar {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
impl SubAssign for Scalar {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}
impl MulAssign for Scalar {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 *= rhs.0;
    }
}
impl Neg for Scalar {
    type Output = Self;
    fn neg(self) -> Self {
        self.neg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_i64_maps_to_high_half() {
        let x = Scalar::from_i64(-1);
        assert!(x.is_negative_repr());
        assert_eq!(x + Scalar::one(), Scalar::zero());
    }

    #[test]
    fn bitand_or_xor_roundtrip() {
        let a = Scalar::from_u64(0b1100);
        let b = Scalar::from_u64(0b1010);
        assert_eq!(a.bitand(b), Scalar::from_u64(0b1000));
        assert_eq!(a.bitor(b), Scalar::from_u64(0b1110));
        assert_eq!(a.bitxor(b), Scalar::from_u64(0b0110));
    }

    #[test]
    fn idiv_rem_matches_native() {
        let (q, r) = Scalar::from_u64(17).idiv_rem(Scalar::from_u64(5));
        assert_eq!(q, Scalar::from_u64(3));
        assert_eq!(r, Scalar::from_u64(2));
    }

    #[test]
    fn shift_roundtrip() {
        let x = Scalar::from_u64(1);
        assert_eq!(x.shl_mod(8), Scalar::from_u64(256));
        assert_eq!(Scalar::from_u64(256).shr(8), Scalar::from_u64(1));
    }
}
