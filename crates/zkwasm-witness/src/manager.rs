//! The pooled witness manager (spec component B).
//!
//! Allocates field-element witnesses from a recycled pool, accumulates
//! linear and quadratic constraints against them via a random-linear-check
//! accumulator, and lazily commits each witness into one of three row
//! streams — linear, quadratic (L/R/O), or (once, at [`WitnessManager::finalize`])
//! mask — the moment its last algebraic reference is released.
//!
//! Grounded on `witness_manager.hpp`'s `witness_manager<Field, RandomPolicy>`.

use crate::pool::{Cell, Group, Pool, QuadPos, Role};
pub use crate::pool::{GroupId, WitnessId};
use zkwasm_field::{RandomStreams, Scalar};

type LinearCallback = Box<dyn FnMut(&[Scalar], &[Scalar])>;
type QuadraticCallback =
    Box<dyn FnMut(&[Scalar], &[Scalar], &[Scalar], &[Scalar], &[Scalar], &[Scalar])>;
type MaskCallback = Box<dyn FnMut(&[Scalar], &[Scalar], &[Scalar])>;

/// Owns the pooled witness cells and the three outgoing row streams.
pub struct WitnessManager {
    row_size: usize,
    padded_row_size: usize,

    cells: Pool<Cell>,
    groups: Pool<Group>,

    linear_val: Vec<Scalar>,
    linear_random: Vec<Scalar>,
    quadratic_val: [Vec<Scalar>; 3],
    quadratic_random: [Vec<Scalar>; 3],

    linear_counter: u64,
    quadratic_counter: u64,
    constant_sum: Scalar,

    streams: RandomStreams,

    linear_callback: Option<LinearCallback>,
    quadratic_callback: Option<QuadraticCallback>,
    mask_callback: Option<MaskCallback>,
}

impl WitnessManager {
    /// Construct a manager for rows of `row_size` live entries padded up to
    /// `padded_row_size`, deriving its four named randomness streams from
    /// `master_seed` (shared verbatim across prover stages for replay
    /// determinism).
    #[must_use]
    pub fn new(row_size: usize, padded_row_size: usize, master_seed: [u8; 32]) -> Self {
        assert!(padded_row_size >= row_size, "padded row must not shrink");
        Self {
            row_size,
            padded_row_size,
            cells: Pool::default(),
            groups: Pool::default(),
            linear_val: Vec::with_capacity(padded_row_size),
            linear_random: Vec::with_capacity(padded_row_size),
            quadratic_val: [Vec::new(), Vec::new(), Vec::new()],
            quadratic_random: [Vec::new(), Vec::new(), Vec::new()],
            linear_counter: 0,
            quadratic_counter: 0,
            constant_sum: Scalar::zero(),
            streams: RandomStreams::from_master_seed(master_seed),
            linear_callback: None,
            quadratic_callback: None,
            mask_callback: None,
        }
    }

    /// Register the callback invoked each time a linear row fills.
    #[must_use]
    pub fn with_linear_callback(mut self, f: impl FnMut(&[Scalar], &[Scalar]) + 'static) -> Self {
        self.linear_callback = Some(Box::new(f));
        self
    }

    /// Register the callback invoked each time the three quadratic rows fill.
    #[must_use]
    pub fn with_quadratic_callback(
        mut self,
        f: impl FnMut(&[Scalar], &[Scalar], &[Scalar], &[Scalar], &[Scalar], &[Scalar]) + 'static,
    ) -> Self {
        self.quadratic_callback = Some(Box::new(f));
        self
    }

    /// Register the callback invoked once, at [`Self::finalize`], with the
    /// three mask rows.
    #[must_use]
    pub fn with_mask_callback(
        mut self,
        f: impl FnMut(&[Scalar], &[Scalar], &[Scalar]) + 'static,
    ) -> Self {
        self.mask_callback = Some(Box::new(f));
        self
    }

    /// Running sum of all per-constraint randomness applied to witnesses
    /// tied to compile-time constants — the verifier checks this against
    /// the public inputs independently of the row streams.
    #[must_use]
    pub const fn constant_sum(&self) -> Scalar {
        self.constant_sum
    }

    /// Acquire a fresh witness holding `value`, starting with refcount 1 and
    /// no row assignment (defaults to the linear stream).
    pub fn acquire_witness(&mut self, value: Scalar) -> WitnessId {
        let idx = self.cells.acquire(Cell {
            value,
            random: Scalar::zero(),
            refcount: 1,
            role: Role::Linear,
        });
        WitnessId(idx)
    }

    /// Add one algebraic reference to `id`.
    pub fn retain(&mut self, id: WitnessId) {
        self.cells.get_mut(id.0).refcount += 1;
    }

    /// The witness's current value.
    #[must_use]
    pub fn value_of(&self, id: WitnessId) -> Scalar {
        self.cells.get(id.0).value
    }

    /// Release one algebraic reference to `id`; commits the witness into its
    /// row stream once the refcount reaches zero.
    pub fn release(&mut self, id: WitnessId) {
        let cell = self.cells.get_mut(id.0);
        cell.refcount -= 1;
        if cell.refcount > 0 {
            return;
        }
        let role = cell.role;
        match role {
            Role::Linear => self.commit_linear(id.0),
            Role::Quadratic(gid, pos) => self.commit_quadratic_member(id.0, gid, pos),
        }
    }

    fn commit_linear(&mut self, idx: u32) {
        let cell = self.cells.recycle(idx);
        if self.linear_val.len() >= self.row_size {
            self.process_reset_linear_row();
        }
        self.linear_val.push(cell.value);
        self.linear_random.push(cell.random);
    }

    fn commit_quadratic_member(&mut self, idx: u32, gid: GroupId, pos: QuadPos) {
        let group = self.groups.get_mut(gid.0);
        group.members[pos.index()] = Some(idx);
        group.ready[pos.index()] = true;
        if !group.ready.iter().all(|r| *r) {
            return;
        }
        let group = self.groups.recycle(gid.0);
        if self.quadratic_val[0].len() >= self.row_size {
            self.process_reset_quadratic_rows();
        }
        for pos in 0..3 {
            let member = group.members[pos].expect("all members ready");
            let cell = self.cells.recycle(member);
            self.quadratic_val[pos].push(cell.value);
            self.quadratic_random[pos].push(cell.random);
        }
    }

    /// Tie `k`'s random accumulator to the constant `v` and fold the
    /// corresponding term into [`Self::constant_sum`].
    ///
    /// # Panics
    /// Panics (debug-only invariant) if `k`'s current value differs from `v`.
    pub fn constrain_constant(&mut self, k: WitnessId, v: Scalar) {
        debug_assert_eq!(self.cells.get(k.0).value, v, "constant witness value mismatch");
        let rand = self.streams.linear_test.next_scalar();
        self.witness_add_random(k, rand);
        self.constant_sum -= rand * v;
    }

    /// Tie two witnesses' randoms so the verifier's linear check enforces
    /// `a == b`.
    ///
    /// # Panics
    /// Panics (debug-only invariant) if the two witnesses' values differ.
    pub fn constrain_equal(&mut self, a: WitnessId, b: WitnessId) {
        debug_assert_eq!(self.cells.get(a.0).value, self.cells.get(b.0).value);
        let rand = self.streams.linear_test.next_scalar();
        self.witness_add_random(a, rand);
        self.witness_sub_random(b, rand);
    }

    /// A fresh witness equal to `id`, linear-tied to it.
    pub fn clone_witness(&mut self, id: WitnessId) -> WitnessId {
        let value = self.value_of(id);
        let cloned = self.acquire_witness(value);
        self.constrain_equal(id, cloned);
        cloned
    }

    /// Constrain `b` to be boolean (`b * b = b`) via a one-shot quadratic
    /// triple of two clones.
    pub fn constrain_bit(&mut self, b: WitnessId) {
        let w1 = self.clone_witness(b);
        let w2 = self.clone_witness(b);
        self.constrain_quadratic(b, w1, w2);
        self.release(w1);
        self.release(w2);
    }

    /// Constrain `c == a + b` via a shared random-linear-check term.
    pub fn constrain_linear(&mut self, c: WitnessId, a: WitnessId, b: WitnessId) {
        let rand = self.streams.linear_test.next_scalar();
        self.witness_add_random(a, rand);
        self.witness_add_random(b, rand);
        self.witness_sub_random(c, rand);
    }

    /// Constrain `a == c * k` for a compile-time constant `k`.
    pub fn constrain_quadratic_constant(&mut self, c: WitnessId, a: WitnessId, k: Scalar) {
        let rand = self.streams.linear_test.next_scalar();
        self.witness_add_random(c, rand);
        self.witness_sub_random(a, rand * k);
    }

    /// Constrain `a * b == c` by binding all three into a quadratic group
    /// that commits together, leg-for-leg, into the L/R/O row streams.
    ///
    /// A witness already bound to another group is first cloned (and
    /// linear-tied to the original) since each witness may occupy only one
    /// quadratic leg at a time; the clone is committed on the caller's
    /// behalf immediately. A witness taking a slot directly keeps the
    /// caller's existing reference — the caller releases it once it's done
    /// with it, same as any other witness.
    pub fn constrain_quadratic(&mut self, c: WitnessId, a: WitnessId, b: WitnessId) {
        let gid = GroupId(self.groups.acquire(Group {
            members: [None, None, None],
            ready: [false, false, false],
        }));

        let legs = [(a, QuadPos::L), (b, QuadPos::R), (c, QuadPos::O)];
        for (witness, pos) in legs {
            let needs_clone = matches!(self.cells.get(witness.0).role, Role::Quadratic(..));
            let member = if needs_clone {
                self.clone_witness(witness)
            } else {
                witness
            };
            self.cells.get_mut(member.0).role = Role::Quadratic(gid, pos);
            if needs_clone {
                self.release(member);
            }
        }
    }

    /// Accumulate `rand` onto witness `id`'s random-linear-check term.
    pub fn witness_add_random(&mut self, id: WitnessId, rand: Scalar) {
        self.cells.get_mut(id.0).random += rand;
    }

    /// Subtract `rand` from witness `id`'s random-linear-check term.
    pub fn witness_sub_random(&mut self, id: WitnessId, rand: Scalar) {
        self.cells.get_mut(id.0).random -= rand;
    }

    /// Overwrite `id`'s concrete value (used by the algebraic backend while
    /// materializing a composite expression node, before its final value is
    /// known).
    pub fn set_value(&mut self, id: WitnessId, value: Scalar) {
        self.cells.get_mut(id.0).value = value;
    }

    /// Draw the next linear-test challenge, used to tie a fresh constraint's
    /// witnesses together.
    pub fn next_linear_random(&mut self) -> Scalar {
        self.streams.linear_test.next_scalar()
    }

    /// Fold `v` into the public constant-sum accumulator (additively).
    pub fn constsum_add(&mut self, v: Scalar) {
        self.constant_sum += v;
    }

    /// Fold `v` into the public constant-sum accumulator (subtractively).
    pub fn constsum_sub(&mut self, v: Scalar) {
        self.constant_sum -= v;
    }

    fn pad_encoding_random(vec: &mut Vec<Scalar>, streams: &mut RandomStreams, n: usize) {
        for _ in 0..n {
            vec.push(streams.encoding.next_scalar());
        }
    }

    fn process_reset_linear_row(&mut self) {
        if self.linear_val.is_empty() {
            return;
        }
        let data_size = self.linear_val.len();
        let pad_zero = self.row_size - data_size;
        let pad_random = self.padded_row_size - self.row_size;
        self.linear_counter += data_size as u64;

        self.linear_val.resize(self.linear_val.len() + pad_zero, Scalar::zero());
        Self::pad_encoding_random(&mut self.linear_val, &mut self.streams, pad_random);
        self.linear_random
            .resize(self.padded_row_size, Scalar::zero());
        debug_assert_eq!(self.linear_val.len(), self.padded_row_size);

        if let Some(cb) = self.linear_callback.as_mut() {
            cb(&self.linear_val, &self.linear_random);
        }
        self.linear_val.clear();
        self.linear_random.clear();
    }

    fn process_reset_quadratic_rows(&mut self) {
        if self.quadratic_val[0].is_empty() {
            return;
        }
        let data_size = self.quadratic_val[0].len();
        let pad_zero = self.row_size - data_size;
        let pad_random = self.padded_row_size - self.row_size;
        self.quadratic_counter += data_size as u64;

        for k in 0..3 {
            self.quadratic_val[k].resize(self.quadratic_val[k].len() + pad_zero, Scalar::zero());
            Self::pad_encoding_random(&mut self.quadratic_val[k], &mut self.streams, pad_random);
            self.quadratic_random[k].resize(self.padded_row_size, Scalar::zero());
            debug_assert_eq!(self.quadratic_val[k].len(), self.padded_row_size);
        }

        if let Some(cb) = self.quadratic_callback.as_mut() {
            cb(
                &self.quadratic_val[0],
                &self.quadratic_random[0],
                &self.quadratic_val[1],
                &self.quadratic_random[1],
                &self.quadratic_val[2],
                &self.quadratic_random[2],
            );
        }
        for k in 0..3 {
            self.quadratic_val[k].clear();
            self.quadratic_random[k].clear();
        }
    }

    /// Generate the three mask rows (code-test, linear-test, quadratic-test)
    /// once all live witnesses have drained — these blind the sampled
    /// columns without perturbing any of the algebraic checks they mask.
    fn process_masks(&mut self) {
        let k = self.padded_row_size;

        // Code-test mask: a full row of encoding randomness.
        let mut code_mask = Vec::with_capacity(k);
        Self::pad_encoding_random(&mut code_mask, &mut self.streams, k);

        // Linear-test mask: `k` interleaved `[0, rand]` pairs spanning the
        // whole 2k-length buffer, the last random forced to minus the sum
        // of the rest, so the first `l = k - sample_size` positions of its
        // NTT-inverse are zero.
        let mut linear_mask = Vec::with_capacity(2 * k);
        let mut sum = Scalar::zero();
        for _ in 0..k - 1 {
            let r = self.streams.encoding.next_scalar();
            sum += r;
            linear_mask.push(Scalar::zero());
            linear_mask.push(r);
        }
        linear_mask.push(Scalar::zero());
        linear_mask.push(sum.neg());

        // Quadratic-test mask: `k` interleaved `[0, rand]` pairs spanning
        // the whole 2k-length buffer, with no constraint on the sum.
        let mut quad_mask = Vec::with_capacity(2 * k);
        for _ in 0..k {
            quad_mask.push(Scalar::zero());
            quad_mask.push(self.streams.encoding.next_scalar());
        }

        if let Some(cb) = self.mask_callback.as_mut() {
            cb(&code_mask, &linear_mask, &quad_mask);
        }
    }

    /// Flush any partially filled rows, emit the mask rows, and assert the
    /// pool drained cleanly. Call once after the whole program has executed.
    ///
    /// # Panics
    /// Panics if any witness is still live (a leaked reference).
    pub fn finalize(&mut self) {
        self.process_reset_linear_row();
        self.process_reset_quadratic_rows();
        self.process_masks();
        assert_eq!(self.cells.in_use(), 0, "witness manager: leaked live witness");
    }

    /// Total number of linear constraints committed so far.
    #[must_use]
    pub const fn linear_constraint_count(&self) -> u64 {
        self.linear_counter
    }

    /// Total number of quadratic constraints committed so far.
    #[must_use]
    pub const fn quadratic_constraint_count(&self) -> u64 {
        self.quadratic_counter
    }
}
