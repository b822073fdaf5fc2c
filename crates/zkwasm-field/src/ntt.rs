//! In-place radix-2 Cooley-Tukey NTT/INTT over the BN254 scalar field.
//!
//! The forward transform maps coefficients to evaluations over a `2^k`
//! subgroup; the inverse transform maps evaluations back to coefficients.
//! Bit-reversed reordering (DIT) plus per-stage twiddle tables, following
//! the same structure regardless of the underlying field.

use crate::scalar::Scalar;
use ark_ff::FftField;

#[inline]
fn bitrev(mut x: usize, bits: usize) -> usize {
    let mut y = 0usize;
    for _ in 0..bits {
        y = (y << 1) | (x & 1);
        x >>= 1;
    }
    y
}

#[inline]
fn bit_reverse_permute(a: &mut [Scalar]) {
    let n = a.len();
    debug_assert!(n.is_power_of_two(), "length must be power of two");
    let bits = n.trailing_zeros() as usize;
    for i in 0..n {
        let j = bitrev(i, bits);
        if j > i {
            a.swap(i, j);
        }
    }
}

fn root_2exp(k: u32) -> Scalar {
    Scalar(
        ark_bn254::Fr::get_root_of_unity(1u64 << k)
            .expect("k exceeds BN254 scalar field 2-adicity"),
    )
}

#[inline]
fn build_twiddles_forward(n_log2: usize) -> Vec<Vec<Scalar>> {
    let mut out = Vec::with_capacity(n_log2);
    for s in 1..=n_log2 {
        let half = 1usize << (s - 1);
        let w_len = root_2exp(s as u32);
        let mut ws = Vec::with_capacity(half);
        let mut w = Scalar::one();
        for _ in 0..half {
            ws.push(w);
            w *= w_len;
        }
        out.push(ws);
    }
    out
}

#[inline]
fn build_twiddles_inverse(n_log2: usize) -> Vec<Vec<Scalar>> {
    let mut out = Vec::with_capacity(n_log2);
    for s in 1..=n_log2 {
        let half = 1usize << (s - 1);
        let w_len_inv = root_2exp(s as u32).inv();
        let mut ws = Vec::with_capacity(half);
        let mut w = Scalar::one();
        for _ in 0..half {
            ws.push(w);
            w *= w_len_inv;
        }
        out.push(ws);
    }
    out
}

/// Forward NTT in place (coefficients -> values). Length must be a power of two.
pub fn forward_ntt_in_place(a: &mut [Scalar]) {
    let n = a.len();
    if n <= 1 {
        return;
    }
    assert!(n.is_power_of_two(), "NTT size must be power of two");
    bit_reverse_permute(a);

    let n_log2 = n.trailing_zeros() as usize;
    let tw = build_twiddles_forward(n_log2);

    let mut len = 2usize;
    let mut stage = 1usize;
    while len <= n {
        let half = len / 2;
        let w_stage = &tw[stage - 1];

        let mut j = 0usize;
        while j < n {
            for i in 0..half {
                let u = a[j + i];
                let v = a[j + i + half] * w_stage[i];
                a[j + i] = u + v;
                a[j + i + half] = u - v;
            }
            j += len;
        }

        stage += 1;
        len <<= 1;
    }
}

/// Inverse NTT in place (values -> coefficients). Length must be a power of two.
pub fn inverse_ntt_in_place(a: &mut [Scalar]) {
    let n = a.len();
    if n <= 1 {
        return;
    }
    assert!(n.is_power_of_two(), "NTT size must be power of two");
    bit_reverse_permute(a);

    let n_log2 = n.trailing_zeros() as usize;
    let tw_inv = build_twiddles_inverse(n_log2);

    let mut len = 2usize;
    let mut stage = 1usize;
    while len <= n {
        let half = len / 2;
        let w_stage = &tw_inv[stage - 1];

        let mut j = 0usize;
        while j < n {
            for i in 0..half {
                let u = a[j + i];
                let t = a[j + i + half] * w_stage[i];
                a[j + i] = u + t;
                a[j + i + half] = u - t;
            }
            j += len;
        }

        stage += 1;
        len <<= 1;
    }

    let inv_n = Scalar::from_u64(n as u64).inv();
    for x in a.iter_mut() {
        *x *= inv_n;
    }
}

/// Evaluate a polynomial (given by coefficients) on a `2^k` domain using NTT.
/// Zero-pads if `coeffs.len() < 2^k`; truncates if longer.
#[must_use]
pub fn evaluate_on_pow2_domain(coeffs: &[Scalar], k_log2: usize) -> Vec<Scalar> {
    let n = 1usize << k_log2;
    let mut buf = vec![Scalar::zero(); n];
    let m = coeffs.len().min(n);
    buf[..m].copy_from_slice(&coeffs[..m]);
    forward_ntt_in_place(&mut buf);
    buf
}

/// Interpolate coefficients from evaluations on a `2^k` domain using INTT.
#[must_use]
pub fn interpolate_from_evals(evals: &[Scalar]) -> Vec<Scalar> {
    let mut buf = evals.to_vec();
    inverse_ntt_in_place(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntt_roundtrip_various_sizes() {
        for k in 1..=8 {
            let n = 1usize << k;
            let mut v: Vec<Scalar> = (0..n).map(|i| Scalar::from_u64(i as u64 + 1)).collect();
            let original = v.clone();
            forward_ntt_in_place(&mut v);
            inverse_ntt_in_place(&mut v);
            assert_eq!(v, original, "round-trip failed (n = 2^{k})");
        }
    }
}
