//! Stage 3: sample (spec §4.E).
//!
//! Replays the program a third time with the sample indices already fixed
//! (derived from Stage 2's seed by the caller — see [`crate::sample`]),
//! rebuilding the same per-column hashes Stage 1 built (so it can produce
//! authentication paths without Stage 1's tree ever having to survive
//! across stages) while also recording each sampled column's raw values.

use std::cell::RefCell;
use std::rc::Rc;

use zkwasm_core::{SampledColumn, TrapReason};
use zkwasm_field::ntt::evaluate_on_pow2_domain;
use zkwasm_field::Scalar;
use zkwasm_interp::{HostTable, Module, TracedValue};
use zkwasm_merkle::MerkleTree;
use zkwasm_witness::WitnessManager;

use crate::args::ProgramArgs;
use crate::column::ColumnHasher;
use crate::config::ExecConfig;
use crate::runner::execute;

struct SampleAccumulator {
    hasher: ColumnHasher,
    indices: Vec<usize>,
    columns: Vec<Vec<Scalar>>,
}

impl SampleAccumulator {
    fn new(config: &ExecConfig, indices: Vec<usize>) -> Self {
        let columns = indices.iter().map(|_| Vec::new()).collect();
        Self { hasher: ColumnHasher::new(config.encoding_size()), indices, columns }
    }

    fn absorb_row(&mut self, codeword: &[Scalar]) {
        self.hasher.absorb_row(codeword);
        for (col, &idx) in self.columns.iter_mut().zip(&self.indices) {
            col.push(codeword[idx]);
        }
    }
}

fn new_manager(
    config: &ExecConfig,
    indices: Vec<usize>,
) -> (WitnessManager, Rc<RefCell<SampleAccumulator>>) {
    let acc = Rc::new(RefCell::new(SampleAccumulator::new(config, indices)));
    let log2 = config.encoding_size_log2();

    let lin = Rc::clone(&acc);
    let quad = Rc::clone(&acc);
    let mask = Rc::clone(&acc);

    let mgr = WitnessManager::new(config.row_size, config.padded_row_size(), config.master_seed)
        .with_linear_callback(move |val, _rand| {
            lin.borrow_mut().absorb_row(&evaluate_on_pow2_domain(val, log2));
        })
        .with_quadratic_callback(move |l, _lr, r, _rr, o, _or| {
            let mut a = quad.borrow_mut();
            a.absorb_row(&evaluate_on_pow2_domain(l, log2));
            a.absorb_row(&evaluate_on_pow2_domain(r, log2));
            a.absorb_row(&evaluate_on_pow2_domain(o, log2));
        })
        .with_mask_callback(move |code, linear, quadratic| {
            let mut a = mask.borrow_mut();
            a.absorb_row(&evaluate_on_pow2_domain(code, log2));
            a.absorb_row(&evaluate_on_pow2_domain(linear, log2));
            a.absorb_row(&evaluate_on_pow2_domain(quadratic, log2));
        });

    (mgr, acc)
}

/// Stage 3's output: the sampled-column table (spec §6 proof archive item
/// 4) plus the program results, kept for the caller to cross-check against
/// Stage 1/2's.
pub struct Stage3Result {
    /// One entry per sampled column index, with its Merkle decommitment.
    pub sampled_columns: Vec<SampledColumn>,
    /// The Merkle root this replay reconstructed — should equal Stage 1's.
    pub merkle_root: zkwasm_merkle::Digest32,
    /// The entry function's return values.
    pub outputs: Vec<TracedValue>,
}

/// Run Stage 3 to completion, sampling exactly `indices`.
///
/// # Errors
/// Propagates a trap exactly as encountered; per spec §7 the whole proof
/// attempt is abandoned.
pub fn run(
    module: &Module,
    entry: u32,
    args: &ProgramArgs,
    host: HostTable,
    config: &ExecConfig,
    indices: Vec<usize>,
) -> Result<Stage3Result, TrapReason> {
    tracing::info!(sample_count = indices.len(), "stage 3: sample");
    let (mut mgr, acc) = new_manager(config, indices);
    let traced_args = args.acquire(&mut mgr);
    let (outputs, mut mgr) = execute(module, entry, traced_args, host, mgr).map_err(|t| {
        tracing::error!(reason = %t, "stage 3 trapped");
        t
    })?;
    mgr.finalize();

    let acc = Rc::try_unwrap(acc)
        .unwrap_or_else(|_| unreachable!("no callback closures outlive finalize()"))
        .into_inner();

    let leaves = acc.hasher.into_leaves();
    let tree = MerkleTree::build(leaves.clone());
    let merkle_root = tree.root();

    let sampled_columns: Vec<SampledColumn> = acc
        .indices
        .into_iter()
        .zip(acc.columns)
        .map(|(idx, column)| SampledColumn {
            index: idx as u32,
            leaf_digest: leaves[idx],
            auth_path: tree.authentication_path(idx),
            column,
        })
        .collect();
    tracing::info!(columns = sampled_columns.len(), "stage 3 done");

    Ok(Stage3Result { sampled_columns, merkle_root, outputs })
}
