//! Row encoding: the NTT-based codeword construction shared by all three
//! transcript sinks.
//!
//! A row is `padded_row_size` field elements. `encoding_size` is fixed at
//! `4 * padded_row_size` (spec §4.A). Encoding is a forward NTT over the
//! `2^k` domain whose size equals `encoding_size` rounded up to the next
//! power of two; `encoding_size` is required by construction to already be
//! a power of two since `padded_row_size` is chosen that way upstream.

use crate::ntt::{forward_ntt_in_place, inverse_ntt_in_place};
use crate::scalar::Scalar;

/// Forward-encode one row (message followed by padding randomness) into its
/// length-`n` codeword, where `n = 4 * row.len()`.
///
/// # Panics
/// Panics if `row.len()` is not a power of two.
#[must_use]
pub fn encode_row(row: &[Scalar]) -> Vec<Scalar> {
    let k = row.len();
    assert!(k.is_power_of_two(), "padded_row_size must be a power of two");
    let n = 4 * k;
    let mut buf = vec![Scalar::zero(); n];
    buf[..k].copy_from_slice(row);
    forward_ntt_in_place(&mut buf);
    buf
}

/// Inverse of [`encode_row`]: recovers the first `k` coefficients from a
/// length-`n = 4k` codeword.
#[must_use]
pub fn decode_row(codeword: &[Scalar], k: usize) -> Vec<Scalar> {
    let mut buf = codeword.to_vec();
    inverse_ntt_in_place(&mut buf);
    buf.truncate(k);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let row: Vec<Scalar> = (0..16u64).map(Scalar::from_u64).collect();
        let codeword = encode_row(&row);
        assert_eq!(codeword.len(), 64);
        let back = decode_row(&codeword, 16);
        assert_eq!(back, row);
    }
}
