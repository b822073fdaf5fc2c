//! Coset LDE tests.
//!
//! Invariants tested:
//! 1) `shift = 1` matches plain NTT on the base subgroup.
//! 2) Scaling-by-`shift^j` in coefficient space equals evaluating the original
//!    polynomial on the multiplicative coset with that `shift`.

use zkwasm_field::{coset::evaluate_on_coset_pow2, ntt::evaluate_on_pow2_domain, Scalar};

fn det_coeffs(n: usize) -> Vec<Scalar> {
    (0..n)
        .map(|i| Scalar::from_u64((i as u64).wrapping_mul(0xDEAD_BEEF_u64 ^ 0x42)))
        .collect()
}

#[test]
fn coset_shift_one_matches_plain_ntt() {
    for k in 1..=10 {
        let n = 1usize << k;
        let coeffs = det_coeffs(n);

        let evals_plain = evaluate_on_pow2_domain(&coeffs, k);
        let evals_coset = evaluate_on_coset_pow2(&coeffs, k, Scalar::from_u64(1));

        assert_eq!(
            evals_coset, evals_plain,
            "coset shift=1 should equal plain NTT (n = 2^{k})"
        );
    }
}

#[test]
fn coset_scaling_invariant() {
    let shift = Scalar::from_u64(7);
    for k in 4..=10 {
        let n = 1usize << k;
        let coeffs = det_coeffs(n);

        let mut pow = Scalar::from_u64(1);
        let mut scaled = Vec::with_capacity(n);
        for &c in &coeffs {
            scaled.push(c * pow);
            pow *= shift;
        }

        let evals_scaled_on_base = evaluate_on_pow2_domain(&scaled, k);
        let evals_orig_on_coset = evaluate_on_coset_pow2(&coeffs, k, shift);

        assert_eq!(
            evals_scaled_on_base, evals_orig_on_coset,
            "scaling-by-shift^j invariant failed (n = 2^{k})"
        );
    }
}
