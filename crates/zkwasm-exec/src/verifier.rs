//! The verifier (spec §4.E): mirrors Stages 1 and 2 working only on the
//! sampled columns and the full aggregate codewords, both already present
//! in the [`ProofArchive`] — it never re-executes the guest program.
//!
//! Checks performed, each grounded in a specific spec passage:
//!
//! - **Stage-2 seed recomputation** (spec §6 item 2: "SHA-256 over the
//!   three encoded aggregates") — catches a prover that swapped in
//!   aggregates inconsistent with its own claimed seed.
//! - **Sample-index re-derivation** (spec §4.E: "re-samples the same
//!   indices using the same Fiat-Shamir transform") — the archive's sampled
//!   columns must be exactly the indices [`crate::sample::derive_sample_indices`]
//!   picks from the recomputed seed.
//! - **Column decommitment** (spec §4.E: "reconstructs its own hash-tree
//!   column hash") — each sampled column's raw per-row values must hash
//!   (under the same domain-tagged running SHA-256 [`crate::column::ColumnHasher`] uses) to
//!   its claimed leaf digest, and that leaf's authentication path must
//!   recompute the archive's Merkle root.
//! - **Exit-code validation** (spec §6: "code-row zero tail, linear-row
//!   sums to recorded constant, quadratic-row sums to zero") — decoding the
//!   three aggregate codewords back to coefficient form.

use anyhow::{ensure, Result};
use zkwasm_core::ProofArchive;
use zkwasm_field::encode::decode_row;
use zkwasm_field::ntt::interpolate_from_evals;
use zkwasm_field::Scalar;
use zkwasm_merkle::{leaf_hash, Digest32};

use crate::config::ExecConfig;
use crate::sample::derive_sample_indices;
use crate::stage2::seed_from_aggregates;

/// Recompute the leaf digest a [`crate::column::ColumnHasher`] would have produced for a
/// single column's raw values, without instantiating hashers for every
/// other column.
fn leaf_digest_of(column: &[Scalar]) -> Digest32 {
    let bytes: Vec<u8> = column.iter().flat_map(|x| x.to_le_bytes()).collect();
    leaf_hash(&bytes)
}

/// Verify `archive` against `config` and the publicly-known expected linear
/// constant sum (the value the prover's `constant_sum` must reduce to,
/// computed by the caller from the program's public inputs — deriving it is
/// outside this crate, same as loading the program itself, spec §1).
///
/// # Errors
/// Returns a descriptive error on the first failing check. Never panics on
/// malformed input (spec `ProvingBackend::verify`'s contract).
pub fn verify(archive: &ProofArchive, config: &ExecConfig, expected_constant_sum: Scalar) -> Result<()> {
    let expected_seed =
        seed_from_aggregates(&archive.code_aggregate, &archive.linear_aggregate, &archive.quadratic_aggregate);
    ensure!(
        expected_seed == archive.stage2_seed,
        "stage2 seed mismatch: archive claims {:?}, aggregates imply {:?}",
        archive.stage2_seed,
        expected_seed
    );

    let n = config.encoding_size();
    let expected_indices = derive_sample_indices(archive.stage2_seed, config.sample_size, n);
    let mut archive_indices: Vec<usize> = archive.sampled_columns.iter().map(|c| c.index as usize).collect();
    archive_indices.sort_unstable();
    let mut expected_sorted = expected_indices.clone();
    expected_sorted.sort_unstable();
    ensure!(
        archive_indices == expected_sorted,
        "sampled column indices don't match the Fiat-Shamir re-derivation"
    );

    let row_count = archive.sampled_columns.first().map(|c| c.column.len());
    for col in &archive.sampled_columns {
        if let Some(expected_len) = row_count {
            ensure!(
                col.column.len() == expected_len,
                "sampled column {} has {} rows, expected {expected_len}",
                col.index,
                col.column.len()
            );
        }
        let recomputed = leaf_digest_of(&col.column);
        ensure!(
            recomputed == col.leaf_digest,
            "sampled column {} leaf digest doesn't match its opened values",
            col.index
        );
        ensure!(
            col.auth_path.verify(col.leaf_digest, archive.merkle_root),
            "sampled column {} authentication path doesn't reach the Merkle root",
            col.index
        );
    }

    let k = config.padded_row_size();
    if archive.code_aggregate.len() == n {
        let coeffs = decode_row(&archive.code_aggregate, k);
        let tail = &coeffs[config.row_size..];
        ensure!(
            tail.iter().all(|x| *x == Scalar::zero()),
            "code aggregate's tail beyond row_size isn't zero — rows don't all lie on the code"
        );
    }

    if archive.linear_aggregate.len() == n {
        let coeffs = decode_row(&archive.linear_aggregate, k);
        let sum = coeffs.iter().copied().fold(Scalar::zero(), |a, b| a + b);
        ensure!(
            sum == expected_constant_sum,
            "linear aggregate doesn't sum to the recorded constant"
        );
    }

    if archive.quadratic_aggregate.len() == n {
        let coeffs = interpolate_from_evals(&archive.quadratic_aggregate);
        let sum = coeffs.iter().copied().fold(Scalar::zero(), |a, b| a + b);
        ensure!(sum == Scalar::zero(), "quadratic aggregate doesn't sum to zero");
    }

    Ok(())
}
