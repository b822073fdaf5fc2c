//! Stage 2: reduce-and-sum (spec §4.E).
//!
//! Every row is NTT-encoded, then folded into three persistent
//! codeword-length aggregates under a fresh per-row random drawn from a
//! *second*, independently-instantiated [`RandomStreams`] (same master
//! seed, so it reproduces bit-identically, but advanced by Stage 2's own
//! calls rather than the witness manager's internal `linear_test` draws):
//!
//! - **code test**: `Σ code_r · encode(row)` — checks every row lies on the
//!   Reed-Solomon code.
//! - **linear test**: `Σ linear_r · encode(row + rand)` — folds in the
//!   per-slot blinding randoms the manager already tracked per witness, so
//!   the verifier can check the aggregate's low-order coefficients sum to
//!   the recorded `constant_sum`.
//! - **quadratic test**: `Σ quadratic_r · (encode(l)·encode(r) − encode(o))`
//!   — the elementwise product in the evaluation domain is exactly the
//!   pointwise product of the encoded L and R polynomials, so this checks
//!   `l · r = o` across every quadratic triple at once.
//!
//! Mask rows fold into all three aggregates the same way, under one more
//! draw per stream, blinding them before they're revealed to the verifier.

use std::cell::RefCell;
use std::rc::Rc;

use zkwasm_core::TrapReason;
use zkwasm_field::ntt::evaluate_on_pow2_domain;
use zkwasm_field::rng::RandomStreams;
use zkwasm_field::Scalar;
use zkwasm_interp::{HostTable, Module, TracedValue};
use zkwasm_witness::WitnessManager;

use crate::args::ProgramArgs;
use crate::config::ExecConfig;
use crate::runner::execute;

struct Aggregates {
    log2: usize,
    streams: RandomStreams,
    code: Vec<Scalar>,
    linear: Vec<Scalar>,
    quadratic: Vec<Scalar>,
}

impl Aggregates {
    fn new(config: &ExecConfig) -> Self {
        let n = config.encoding_size();
        Self {
            log2: config.encoding_size_log2(),
            streams: RandomStreams::from_master_seed(config.master_seed),
            code: vec![Scalar::zero(); n],
            linear: vec![Scalar::zero(); n],
            quadratic: vec![Scalar::zero(); n],
        }
    }

    fn absorb_linear(&mut self, val: &[Scalar], rand: &[Scalar]) {
        let code_r = self.streams.code_test.next_scalar();
        let linear_r = self.streams.linear_test.next_scalar();

        let val_cw = evaluate_on_pow2_domain(val, self.log2);
        let blinded: Vec<Scalar> = val.iter().zip(rand).map(|(v, r)| *v + *r).collect();
        let blinded_cw = evaluate_on_pow2_domain(&blinded, self.log2);

        for j in 0..self.code.len() {
            self.code[j] += code_r * val_cw[j];
            self.linear[j] += linear_r * blinded_cw[j];
        }
    }

    fn absorb_quadratic(&mut self, l: &[Scalar], r: &[Scalar], o: &[Scalar]) {
        let quad_r = self.streams.quadratic_test.next_scalar();
        let l_cw = evaluate_on_pow2_domain(l, self.log2);
        let r_cw = evaluate_on_pow2_domain(r, self.log2);
        let o_cw = evaluate_on_pow2_domain(o, self.log2);

        for j in 0..self.quadratic.len() {
            self.quadratic[j] += quad_r * (l_cw[j] * r_cw[j] - o_cw[j]);
        }
    }

    fn absorb_mask(&mut self, code: &[Scalar], linear: &[Scalar], quadratic: &[Scalar]) {
        let code_r = self.streams.code_test.next_scalar();
        let linear_r = self.streams.linear_test.next_scalar();
        let quad_r = self.streams.quadratic_test.next_scalar();

        let code_cw = evaluate_on_pow2_domain(code, self.log2);
        let linear_cw = evaluate_on_pow2_domain(linear, self.log2);
        let quad_cw = evaluate_on_pow2_domain(quadratic, self.log2);

        for j in 0..self.code.len() {
            self.code[j] += code_r * code_cw[j];
            self.linear[j] += linear_r * linear_cw[j];
            self.quadratic[j] += quad_r * quad_cw[j];
        }
    }
}

fn new_manager(config: &ExecConfig) -> (WitnessManager, Rc<RefCell<Aggregates>>) {
    let agg = Rc::new(RefCell::new(Aggregates::new(config)));
    let lin = Rc::clone(&agg);
    let quad = Rc::clone(&agg);
    let mask = Rc::clone(&agg);

    let mgr = WitnessManager::new(config.row_size, config.padded_row_size(), config.master_seed)
        .with_linear_callback(move |val, rand| lin.borrow_mut().absorb_linear(val, rand))
        .with_quadratic_callback(move |l, _lr, r, _rr, o, _or| quad.borrow_mut().absorb_quadratic(l, r, o))
        .with_mask_callback(move |code, linear, quadratic| mask.borrow_mut().absorb_mask(code, linear, quadratic));

    (mgr, agg)
}

/// Stage 2's output: the three encoded aggregates and the seed derived from
/// them, which Stage 3 and the verifier both re-derive sample indices from.
pub struct Stage2Result {
    /// `Σ code_r · encode(row)` across every emitted row.
    pub code_aggregate: Vec<Scalar>,
    /// `Σ linear_r · encode(row + rand)` across every emitted row.
    pub linear_aggregate: Vec<Scalar>,
    /// `Σ quadratic_r · (encode(l)·encode(r) − encode(o))` across every
    /// emitted quadratic triple.
    pub quadratic_aggregate: Vec<Scalar>,
    /// SHA-256 over the three aggregates above (spec §6's proof-archive
    /// layout item 2).
    pub stage2_seed: [u8; 32],
    /// The entry function's return values.
    pub outputs: Vec<TracedValue>,
}

/// SHA-256 over the three encoded aggregates, matching
/// [`zkwasm_core::artifact::ProofArchive::stage2_seed`]'s definition.
#[must_use]
pub fn seed_from_aggregates(code: &[Scalar], linear: &[Scalar], quadratic: &[Scalar]) -> [u8; 32] {
    use zkwasm_crypto::{Label, Sha256Transcript, Transcript};

    fn bytes_of(xs: &[Scalar]) -> Vec<u8> {
        xs.iter().flat_map(|x| x.to_le_bytes()).collect()
    }

    let mut t = Sha256Transcript::new("zkwasm.stage2_seed");
    t.absorb(Label::Aggregate.as_str(), &bytes_of(code));
    t.absorb(Label::Aggregate.as_str(), &bytes_of(linear));
    t.absorb(Label::Aggregate.as_str(), &bytes_of(quadratic));
    t.challenge_32(Label::MerkleRoot.as_str())
}

/// Run Stage 2 to completion.
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
) -> Result<Stage2Result, TrapReason> {
    tracing::info!(row_size = config.row_size, sample_size = config.sample_size, "stage 2: reduce-and-sum");
    let (mut mgr, agg) = new_manager(config);
    let traced_args = args.acquire(&mut mgr);
    let (outputs, mut mgr) = execute(module, entry, traced_args, host, mgr).map_err(|t| {
        tracing::error!(reason = %t, "stage 2 trapped");
        t
    })?;
    mgr.finalize();

    let agg = Rc::try_unwrap(agg)
        .unwrap_or_else(|_| unreachable!("no callback closures outlive finalize()"))
        .into_inner();

    let stage2_seed = seed_from_aggregates(&agg.code, &agg.linear, &agg.quadratic);
    tracing::info!(seed = %hex(stage2_seed), "stage 2 done");
    Ok(Stage2Result {
        code_aggregate: agg.code,
        linear_aggregate: agg.linear,
        quadratic_aggregate: agg.quadratic,
        stage2_seed,
        outputs,
    })
}

fn hex(digest: [u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
