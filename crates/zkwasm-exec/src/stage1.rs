//! Stage 1: Merkle-commit (spec §4.E).
//!
//! Every row the witness manager releases — linear rows, the L/R/O rows of
//! quadratic triples, and the three mask rows emitted at `finalize()` — is
//! NTT-encoded and folded into a per-column running hash. The resulting
//! Merkle root becomes the Fiat-Shamir seed for Stage 2.

use std::cell::RefCell;
use std::rc::Rc;

use zkwasm_core::TrapReason;
use zkwasm_field::ntt::evaluate_on_pow2_domain;
use zkwasm_interp::{HostTable, Module, TracedValue};
use zkwasm_merkle::{Digest32, MerkleTree};
use zkwasm_witness::WitnessManager;

use crate::args::ProgramArgs;
use crate::column::ColumnHasher;
use crate::config::ExecConfig;
use crate::runner::execute;

/// Build a witness manager wired with Stage 1's Merkle-commit callbacks,
/// plus the shared column hasher they all feed.
fn new_manager(config: &ExecConfig) -> (WitnessManager, Rc<RefCell<ColumnHasher>>) {
    let hasher = Rc::new(RefCell::new(ColumnHasher::new(config.encoding_size())));
    let log2 = config.encoding_size_log2();

    let lin = Rc::clone(&hasher);
    let quad = Rc::clone(&hasher);
    let mask = Rc::clone(&hasher);

    let mgr = WitnessManager::new(config.row_size, config.padded_row_size(), config.master_seed)
        .with_linear_callback(move |val, _rand| {
            lin.borrow_mut().absorb_row(&evaluate_on_pow2_domain(val, log2));
        })
        .with_quadratic_callback(move |l, _lr, r, _rr, o, _or| {
            let mut h = quad.borrow_mut();
            h.absorb_row(&evaluate_on_pow2_domain(l, log2));
            h.absorb_row(&evaluate_on_pow2_domain(r, log2));
            h.absorb_row(&evaluate_on_pow2_domain(o, log2));
        })
        .with_mask_callback(move |code, linear, quadratic| {
            let mut h = mask.borrow_mut();
            h.absorb_row(&evaluate_on_pow2_domain(code, log2));
            h.absorb_row(&evaluate_on_pow2_domain(linear, log2));
            h.absorb_row(&evaluate_on_pow2_domain(quadratic, log2));
        });

    (mgr, hasher)
}

/// Everything Stage 1 hands downstream: the Merkle root (Stage 2's seed),
/// the tree itself (Stage 3 needs it to open sampled columns), and the
/// program's ordinary results.
pub struct Stage1Result {
    /// The Fiat-Shamir seed for Stage 2.
    pub merkle_root: Digest32,
    /// The full tree, kept so Stage 3 can produce authentication paths
    /// without rebuilding it from scratch.
    pub tree: MerkleTree,
    /// The entry function's return values.
    pub outputs: Vec<TracedValue>,
}

/// Run Stage 1 to completion.
///
/// # Errors
/// Propagates a trap exactly as encountered; per spec §7 the whole proof
/// attempt is abandoned and no partial commitment is produced.
pub fn run(
    module: &Module,
    entry: u32,
    args: &ProgramArgs,
    host: HostTable,
    config: &ExecConfig,
) -> Result<Stage1Result, TrapReason> {
    tracing::info!(row_size = config.row_size, sample_size = config.sample_size, "stage 1: merkle-commit");
    let (mut mgr, hasher) = new_manager(config);
    let traced_args = args.acquire(&mut mgr);
    let (outputs, mut mgr) = execute(module, entry, traced_args, host, mgr).map_err(|t| {
        tracing::error!(reason = %t, "stage 1 trapped");
        t
    })?;
    mgr.finalize();

    let hasher = Rc::try_unwrap(hasher)
        .unwrap_or_else(|_| unreachable!("no callback closures outlive finalize()"))
        .into_inner();
    let tree = hasher.into_tree();
    let merkle_root = tree.root();
    tracing::info!(root = %hex(merkle_root), "stage 1 done");
    Ok(Stage1Result { merkle_root, tree, outputs })
}

fn hex(digest: Digest32) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
