//! Shared sizing parameters for a proving/verifying run (spec §3).

/// `row_size`, `sample_size`, and the master RNG seed a Ligero run is
/// parameterized by. `padded_row_size` and `encoding_size` are derived
/// rather than stored, so there's exactly one place that can disagree with
/// itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExecConfig {
    /// Number of message slots in a transcript row before padding.
    pub row_size: usize,
    /// Number of sampled columns the verifier opens (spec §4.A masking).
    pub sample_size: usize,
    /// Master seed all four PRNG streams (encoding, code-test, linear-test,
    /// quadratic-test) derive from, shared bit-for-bit across every stage.
    pub master_seed: [u8; 32],
}

impl ExecConfig {
    /// `row_size + sample_size`: a transcript row's full width, message
    /// slots followed by padding randomness.
    #[must_use]
    pub const fn padded_row_size(&self) -> usize {
        self.row_size + self.sample_size
    }

    /// `4 * padded_row_size`: the NTT domain every row and mask is encoded
    /// into (spec §4.A).
    #[must_use]
    pub const fn encoding_size(&self) -> usize {
        4 * self.padded_row_size()
    }

    /// `log2(encoding_size)`, the domain [`zkwasm_field::ntt::evaluate_on_pow2_domain`]
    /// zero-extends any shorter buffer (a row, or a `2k`-length mask) up to.
    #[must_use]
    pub fn encoding_size_log2(&self) -> usize {
        self.encoding_size().trailing_zeros() as usize
    }
}
