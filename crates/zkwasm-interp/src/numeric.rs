//! Witnessed numeric operators: every WASM integer instruction paired with
//! the constraints that tie its result to its operands.
//!
//! Grounded on `interpreter_impl.hpp`'s numeric executor together with
//! `core.hpp`'s bit-decomposition primitives — wrapping add/sub/mul go
//! through a decompose-and-truncate (the "drop the carry/overflow bits"
//! pattern every wraparound integer op in this backend uses). Shift and
//! rotate amounts are coerced to concrete integers (the count only ever
//! selects *which* constraints to build, never appears inside a witness, so
//! revealing it costs no soundness) and the ops themselves are plain bit
//! rearrangements: shifts drop bits off one end and pad the other with
//! zeros or sign copies, rotates are a pure reindexing with no new
//! constraints. Signed comparisons multiplex between an unsigned compare
//! and a sign-bit check; signed division extracts each operand's sign,
//! divides the magnitudes, and restores the sign on the way out.

use zkwasm_algebra::{
    bit_compose, bit_decompose, bitwise_eq, bitwise_eqz, bitwise_gt, bitwise_xnor, bitwise_xor,
    eval, idivide_qr, DecomposedBits, Expr,
};
use zkwasm_core::{SignKind, TrapReason, Value, ValueKind};
use zkwasm_field::Scalar;
use zkwasm_witness::{WitnessId, WitnessManager};

use crate::value::TracedValue;

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn concrete_of(kind: ValueKind, raw: u64) -> Value {
    match kind {
        ValueKind::I32 => Value::I32(raw as u32 as i32),
        ValueKind::I64 => Value::I64(raw as i64),
    }
}

/// Decompose `raw`'s value into `total_bits`, keep the low `keep_bits`, and
/// recompose — the standard "truncate to width, drop the carry" pattern.
fn wrap_low_bits(mgr: &mut WitnessManager, raw: WitnessId, total_bits: u32, keep_bits: u32) -> WitnessId {
    let mut bits = bit_decompose(mgr, raw, total_bits);
    bits.drop_msb(mgr, (total_bits - keep_bits) as usize);
    let wrapped = bit_compose(mgr, &bits);
    bits.release_all(mgr);
    mgr.release(raw);
    wrapped
}

/// A boolean witness constrained to `0`, used to pad freshly-shifted-in bits.
fn zero_bit(mgr: &mut WitnessManager) -> WitnessId {
    let z = mgr.acquire_witness(Scalar::zero());
    mgr.constrain_constant(z, Scalar::zero());
    z
}

/// `value` negated modulo `2^width` when `sign` is `1`, else `value`
/// unchanged — the shared "conditional two's-complement negate" used for
/// both absolute-value extraction and sign restoration. Releases neither
/// `sign` nor `value`.
fn conditional_negate(mgr: &mut WitnessManager, width: u32, sign: WitnessId, value: WitnessId) -> WitnessId {
    let two_v = eval(mgr, &Expr::scale(Expr::witness(value), Scalar::from_u64(2)));
    let sign_times_2v = eval(mgr, &Expr::mul(Expr::witness(sign), Expr::witness(two_v)));
    mgr.release(two_v);
    let fill = eval(mgr, &Expr::scale(Expr::witness(sign), Scalar::one().shl_mod(width)));
    let result = eval(
        mgr,
        &Expr::add(Expr::sub(Expr::witness(value), Expr::witness(sign_times_2v)), Expr::witness(fill)),
    );
    mgr.release(sign_times_2v);
    mgr.release(fill);
    result
}

/// Shift amounts are coerced to concrete `u32`s even when computed from a
/// witness: the shift count appears only in the control path that selects
/// *which* constraints to build, never inside a witness itself, so revealing
/// it costs no soundness (spec §4.D: "shift-amounts are always concrete in
/// this design").
fn shift_amount(b: TracedValue, width: u32) -> usize {
    ((b.value.as_u64() & mask(width)) & u64::from(width - 1)) as usize
}

fn per_bit_fold(
    mgr: &mut WitnessManager,
    a: WitnessId,
    b: WitnessId,
    width: u32,
    mut bitfn: impl FnMut(&mut WitnessManager, WitnessId, WitnessId) -> WitnessId,
) -> WitnessId {
    let mut abits = bit_decompose(mgr, a, width);
    let mut bbits = bit_decompose(mgr, b, width);
    let mut out = Vec::with_capacity(width as usize);
    for i in 0..width as usize {
        out.push(bitfn(mgr, abits.get(i), bbits.get(i)));
    }
    let mut result = DecomposedBits::from_bits(out);
    let composed = bit_compose(mgr, &result);
    result.release_all(mgr);
    abits.release_all(mgr);
    bbits.release_all(mgr);
    mgr.release(a);
    mgr.release(b);
    composed
}

fn and_bit(mgr: &mut WitnessManager, x: WitnessId, y: WitnessId) -> WitnessId {
    eval(mgr, &Expr::bitand(Expr::witness(x), Expr::witness(y)))
}

fn or_bit(mgr: &mut WitnessManager, x: WitnessId, y: WitnessId) -> WitnessId {
    eval(
        mgr,
        &Expr::sub(
            Expr::add(Expr::witness(x), Expr::witness(y)),
            Expr::bitand(Expr::witness(x), Expr::witness(y)),
        ),
    )
}

fn xor_bit(mgr: &mut WitnessManager, x: WitnessId, y: WitnessId) -> WitnessId {
    bitwise_xor(mgr, x, y)
}

/// `a + b`, truncated to `width` bits.
pub fn add(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let raw = eval(mgr, &Expr::add(Expr::witness(a.witness), Expr::witness(b.witness)));
    mgr.release(a.witness);
    mgr.release(b.witness);
    let witness = wrap_low_bits(mgr, raw, width + 1, width);
    let concrete = (a.value.as_u64() &a_mask(kind)).wrapping_add(b.value.as_u64() & a_mask(kind)) & mask(width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

fn a_mask(kind: ValueKind) -> u64 {
    mask(kind.bits() as u32)
}

/// `a - b`, truncated to `width` bits.
pub fn sub(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let pow = Scalar::one().shl_mod(width);
    let raw = eval(
        mgr,
        &Expr::add(Expr::sub(Expr::witness(a.witness), Expr::witness(b.witness)), Expr::constant(pow)),
    );
    mgr.release(a.witness);
    mgr.release(b.witness);
    let witness = wrap_low_bits(mgr, raw, width + 1, width);
    let concrete = (a.value.as_u64() & a_mask(kind)).wrapping_sub(b.value.as_u64() & a_mask(kind)) & mask(width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// `a * b`, truncated to `width` bits.
pub fn mul(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let raw = eval(mgr, &Expr::mul(Expr::witness(a.witness), Expr::witness(b.witness)));
    mgr.release(a.witness);
    mgr.release(b.witness);
    let witness = wrap_low_bits(mgr, raw, 2 * width, width);
    let concrete = (a.value.as_u64() & a_mask(kind)).wrapping_mul(b.value.as_u64() & a_mask(kind)) & mask(width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// Unsigned `a / b`, `a % b`. Traps on division by zero.
pub fn div_rem_u(
    mgr: &mut WitnessManager,
    kind: ValueKind,
    a: TracedValue,
    b: TracedValue,
) -> Result<(TracedValue, TracedValue), TrapReason> {
    if b.value.as_u64() & a_mask(kind) == 0 {
        mgr.release(a.witness);
        mgr.release(b.witness);
        return Err(TrapReason::DivisionByZero);
    }
    let width = kind.bits() as u32;
    let (q, r) = idivide_qr(mgr, a.witness, b.witness, width);
    mgr.release(a.witness);
    mgr.release(b.witness);
    let av = a.value.as_u64() & a_mask(kind);
    let bv = b.value.as_u64() & a_mask(kind);
    Ok((
        TracedValue::new(concrete_of(kind, av / bv), q),
        TracedValue::new(concrete_of(kind, av % bv), r),
    ))
}

/// Signed `a / b` (truncating toward zero), `a % b`. Traps on division by
/// zero or on `INT_MIN / -1` overflow.
///
/// Extracts each operand's sign bit, divides the absolute values with an
/// unsigned [`idivide_qr`] (which itself asserts the remainder is in range),
/// then restores the quotient's sign (negative iff the operand signs differ)
/// and the remainder's sign (always the dividend's, matching truncating
/// division).
pub fn div_rem_s(
    mgr: &mut WitnessManager,
    kind: ValueKind,
    a: TracedValue,
    b: TracedValue,
) -> Result<(TracedValue, TracedValue), TrapReason> {
    let width = kind.bits() as u32;
    let (av, bv, min) = match kind {
        ValueKind::I32 => (a.value.as_i64() as i32 as i64, b.value.as_i64() as i32 as i64, i64::from(i32::MIN)),
        ValueKind::I64 => (a.value.as_i64(), b.value.as_i64(), i64::MIN),
    };
    if bv == 0 {
        mgr.release(a.witness);
        mgr.release(b.witness);
        return Err(TrapReason::DivisionByZero);
    }
    if av == min && bv == -1 {
        mgr.release(a.witness);
        mgr.release(b.witness);
        return Err(TrapReason::IntegerOverflow);
    }

    let mut abits = bit_decompose(mgr, a.witness, width);
    let mut bbits = bit_decompose(mgr, b.witness, width);
    let a_sign = abits.get((width - 1) as usize);
    let b_sign = bbits.get((width - 1) as usize);
    mgr.retain(a_sign);
    mgr.retain(b_sign);
    abits.release_all(mgr);
    bbits.release_all(mgr);

    let abs_a = conditional_negate(mgr, width, a_sign, a.witness);
    let abs_b = conditional_negate(mgr, width, b_sign, b.witness);
    mgr.release(a.witness);
    mgr.release(b.witness);

    let (qabs, rabs) = idivide_qr(mgr, abs_a, abs_b, width);
    mgr.release(abs_a);
    mgr.release(abs_b);

    let q_sign = xor_bit(mgr, a_sign, b_sign);
    let signed_q = conditional_negate(mgr, width, q_sign, qabs);
    let signed_r = conditional_negate(mgr, width, a_sign, rabs);
    mgr.release(q_sign);
    mgr.release(qabs);
    mgr.release(rabs);
    mgr.release(a_sign);
    mgr.release(b_sign);

    let qv = av.wrapping_div(bv);
    let rv = av.wrapping_rem(bv);
    Ok((
        TracedValue::new(concrete_of(kind, qv as u64 & mask(width)), signed_q),
        TracedValue::new(concrete_of(kind, rv as u64 & mask(width)), signed_r),
    ))
}

pub fn bitand(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let witness = per_bit_fold(mgr, a.witness, b.witness, width, and_bit);
    let concrete = (a.value.as_u64() & a_mask(kind)) & (b.value.as_u64() & a_mask(kind));
    TracedValue::new(concrete_of(kind, concrete), witness)
}

pub fn bitor(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let witness = per_bit_fold(mgr, a.witness, b.witness, width, or_bit);
    let concrete = (a.value.as_u64() & a_mask(kind)) | (b.value.as_u64() & a_mask(kind));
    TracedValue::new(concrete_of(kind, concrete), witness)
}

pub fn bitxor(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let witness = per_bit_fold(mgr, a.witness, b.witness, width, xor_bit);
    let concrete = (a.value.as_u64() & a_mask(kind)) ^ (b.value.as_u64() & a_mask(kind));
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// `a << n`, truncated to `width` bits, where `n` is `b`'s value taken
/// concretely (see [`shift_amount`]): decompose `a` into bits, drop the `n`
/// that overflow off the top, and prepend `n` fresh zero bits at the bottom.
pub fn shl(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let n = shift_amount(b, width);
    mgr.release(b.witness);

    let mut bits = bit_decompose(mgr, a.witness, width);
    mgr.release(a.witness);
    bits.drop_msb(mgr, n);
    let mut combined = Vec::with_capacity(width as usize);
    for _ in 0..n {
        combined.push(zero_bit(mgr));
    }
    combined.extend_from_slice(bits.as_slice());
    let mut combined = DecomposedBits::from_bits(combined);
    let witness = bit_compose(mgr, &combined);
    combined.release_all(mgr);

    let concrete = (a.value.as_u64() & a_mask(kind)).wrapping_shl(n as u32) & mask(width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// Logical (unsigned) right shift: drop the `n` low bits and append `n`
/// fresh zero bits at the top.
pub fn shr_u(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let n = shift_amount(b, width);
    mgr.release(b.witness);

    let mut bits = bit_decompose(mgr, a.witness, width);
    mgr.release(a.witness);
    bits.drop_lsb(mgr, n);
    let mut combined = bits.as_slice().to_vec();
    for _ in 0..n {
        combined.push(zero_bit(mgr));
    }
    let mut combined = DecomposedBits::from_bits(combined);
    let witness = bit_compose(mgr, &combined);
    combined.release_all(mgr);

    let concrete = (a.value.as_u64() & a_mask(kind)) >> n;
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// Arithmetic (sign-extending) right shift: drop the `n` low bits and
/// append `n` retained copies of the pre-drop sign bit at the top.
pub fn shr_s(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let n = shift_amount(b, width);
    mgr.release(b.witness);

    let mut bits = bit_decompose(mgr, a.witness, width);
    mgr.release(a.witness);
    let sign_bit = bits.get((width - 1) as usize);
    bits.drop_lsb(mgr, n);
    let mut combined = bits.as_slice().to_vec();
    for _ in 0..n {
        mgr.retain(sign_bit);
        combined.push(sign_bit);
    }
    let mut combined = DecomposedBits::from_bits(combined);
    let witness = bit_compose(mgr, &combined);
    combined.release_all(mgr);

    let av = a.value.as_i64();
    let signed = match kind {
        ValueKind::I32 => ((av as i32) >> n) as i64 as u64 & mask(width),
        ValueKind::I64 => (av >> n) as u64,
    };
    TracedValue::new(concrete_of(kind, signed), witness)
}

/// `a` rotated left by `n = b mod width` bits: a pure reindexing of `a`'s
/// bits, `result[i] = a[(i - n) mod width]` — no new constraints beyond the
/// decomposition and recomposition themselves.
pub fn rotl(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let n = shift_amount(b, width) as u32;
    mgr.release(b.witness);

    let bits = bit_decompose(mgr, a.witness, width);
    mgr.release(a.witness);
    let combined: Vec<WitnessId> = (0..width).map(|i| bits.get(((i + width - n) % width) as usize)).collect();
    let mut combined = DecomposedBits::from_bits(combined);
    let witness = bit_compose(mgr, &combined);
    combined.release_all(mgr);

    let av = a.value.as_u64() & a_mask(kind);
    let concrete = (av.wrapping_shl(n) | av.wrapping_shr((width - n) % width)) & mask(width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// `a` rotated right by `n = b mod width` bits: `result[i] = a[(i + n) mod
/// width]`, the mirror image of [`rotl`].
pub fn rotr(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let n = shift_amount(b, width) as u32;
    mgr.release(b.witness);

    let bits = bit_decompose(mgr, a.witness, width);
    mgr.release(a.witness);
    let combined: Vec<WitnessId> = (0..width).map(|i| bits.get(((i + n) % width) as usize)).collect();
    let mut combined = DecomposedBits::from_bits(combined);
    let witness = bit_compose(mgr, &combined);
    combined.release_all(mgr);

    let av = a.value.as_u64() & a_mask(kind);
    let concrete = (av.wrapping_shr(n) | av.wrapping_shl((width - n) % width)) & mask(width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

fn fold_count<F>(mgr: &mut WitnessManager, bits: &DecomposedBits, indices: impl Iterator<Item = usize>, want_one: F) -> WitnessId
where
    F: Fn(WitnessId) -> Expr,
{
    let mut count = eval(mgr, &Expr::constant(Scalar::zero()));
    let mut done = eval(mgr, &Expr::constant(Scalar::zero()));
    for i in indices {
        let bit = bits.get(i);
        let matches = eval(mgr, &want_one(bit));
        let not_done = eval(mgr, &Expr::sub(Expr::constant(Scalar::one()), Expr::witness(done)));
        let increment = eval(mgr, &Expr::mul(Expr::witness(not_done), Expr::witness(matches)));
        let new_count = eval(mgr, &Expr::add(Expr::witness(count), Expr::witness(increment)));
        let progressed = eval(mgr, &Expr::mul(Expr::witness(not_done), Expr::witness(matches)));
        let new_done = eval(mgr, &Expr::add(Expr::witness(done), Expr::witness(progressed)));
        mgr.release(matches);
        mgr.release(not_done);
        mgr.release(increment);
        mgr.release(progressed);
        mgr.release(count);
        mgr.release(done);
        count = new_count;
        done = new_done;
    }
    mgr.release(done);
    count
}

/// Count of leading zero bits (from the MSB).
pub fn clz(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let bits = bit_decompose(mgr, a.witness, width);
    let witness = fold_count(mgr, &bits, (0..width as usize).rev(), |b| Expr::bitnot(Expr::witness(b)));
    bits.release_all(mgr);
    mgr.release(a.witness);
    let concrete = u64::from((a.value.as_u64() & a_mask(kind)).leading_zeros()) - u64::from(64 - width);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// Count of trailing zero bits (from the LSB).
pub fn ctz(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let bits = bit_decompose(mgr, a.witness, width);
    let witness = fold_count(mgr, &bits, 0..width as usize, |b| Expr::bitnot(Expr::witness(b)));
    bits.release_all(mgr);
    mgr.release(a.witness);
    let av = a.value.as_u64() & a_mask(kind);
    let concrete = if av == 0 { u64::from(width) } else { u64::from(av.trailing_zeros()) };
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// Population count (number of set bits).
pub fn popcnt(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let bits = bit_decompose(mgr, a.witness, width);
    let mut acc = eval(mgr, &Expr::constant(Scalar::zero()));
    for i in 0..width as usize {
        let next = eval(mgr, &Expr::add(Expr::witness(acc), Expr::witness(bits.get(i))));
        mgr.release(acc);
        acc = next;
    }
    bits.release_all(mgr);
    mgr.release(a.witness);
    let concrete = u64::from((a.value.as_u64() & a_mask(kind)).count_ones());
    TracedValue::new(concrete_of(kind, concrete), acc)
}

/// `1` iff `a == 0`.
pub fn eqz(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let bits = bit_decompose(mgr, a.witness, width);
    let witness = bitwise_eqz(mgr, &bits);
    bits.release_all(mgr);
    mgr.release(a.witness);
    let concrete = u64::from(a.value.as_u64() & a_mask(kind) == 0);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// `1` iff `a == b`.
pub fn eq(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let abits = bit_decompose(mgr, a.witness, width);
    let bbits = bit_decompose(mgr, b.witness, width);
    let witness = bitwise_eq(mgr, &abits, &bbits);
    abits.release_all(mgr);
    bbits.release_all(mgr);
    mgr.release(a.witness);
    mgr.release(b.witness);
    let concrete = u64::from((a.value.as_u64() & a_mask(kind)) == (b.value.as_u64() & a_mask(kind)));
    TracedValue::new(concrete_of(kind, concrete), witness)
}

/// `1` iff `a != b`.
pub fn ne(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let eq_result = eq(mgr, kind, a, b);
    let witness = eval(mgr, &Expr::bitnot(Expr::witness(eq_result.witness)));
    mgr.release(eq_result.witness);
    let concrete = u64::from(eq_result.value.as_u64() == 0);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

fn unsigned_gt(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let abits = bit_decompose(mgr, a.witness, width);
    let bbits = bit_decompose(mgr, b.witness, width);
    let witness = bitwise_gt(mgr, &abits, &bbits);
    abits.release_all(mgr);
    bbits.release_all(mgr);
    mgr.release(a.witness);
    mgr.release(b.witness);
    let concrete = u64::from((a.value.as_u64() & a_mask(kind)) > (b.value.as_u64() & a_mask(kind)));
    TracedValue::new(concrete_of(kind, concrete), witness)
}

fn signed_gt(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let width = kind.bits() as u32;
    let abits = bit_decompose(mgr, a.witness, width);
    let bbits = bit_decompose(mgr, b.witness, width);
    let a_sign = abits.get((width - 1) as usize);
    let b_sign = bbits.get((width - 1) as usize);

    let unsigned = bitwise_gt(mgr, &abits, &bbits);
    let same_sign = bitwise_xnor(mgr, a_sign, b_sign);
    let not_a_sign = eval(mgr, &Expr::bitnot(Expr::witness(a_sign)));
    let diff = eval(mgr, &Expr::sub(Expr::witness(unsigned), Expr::witness(not_a_sign)));
    let term = eval(mgr, &Expr::mul(Expr::witness(same_sign), Expr::witness(diff)));
    let witness = eval(mgr, &Expr::add(Expr::witness(not_a_sign), Expr::witness(term)));

    mgr.release(unsigned);
    mgr.release(same_sign);
    mgr.release(not_a_sign);
    mgr.release(diff);
    mgr.release(term);
    abits.release_all(mgr);
    bbits.release_all(mgr);
    mgr.release(a.witness);
    mgr.release(b.witness);

    let av = match kind {
        ValueKind::I32 => i64::from(a.value.as_i64() as i32),
        ValueKind::I64 => a.value.as_i64(),
    };
    let bv = match kind {
        ValueKind::I32 => i64::from(b.value.as_i64() as i32),
        ValueKind::I64 => b.value.as_i64(),
    };
    let concrete = u64::from(av > bv);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

pub fn lt(mgr: &mut WitnessManager, kind: ValueKind, sign: SignKind, a: TracedValue, b: TracedValue) -> TracedValue {
    match sign {
        SignKind::Unsigned => unsigned_gt(mgr, kind, b, a),
        SignKind::Signed => signed_gt(mgr, kind, b, a),
    }
}

pub fn gt(mgr: &mut WitnessManager, kind: ValueKind, sign: SignKind, a: TracedValue, b: TracedValue) -> TracedValue {
    match sign {
        SignKind::Unsigned => unsigned_gt(mgr, kind, a, b),
        SignKind::Signed => signed_gt(mgr, kind, a, b),
    }
}

fn negate_bool(mgr: &mut WitnessManager, v: TracedValue, kind: ValueKind) -> TracedValue {
    let witness = eval(mgr, &Expr::bitnot(Expr::witness(v.witness)));
    mgr.release(v.witness);
    let concrete = u64::from(v.value.as_u64() == 0);
    TracedValue::new(concrete_of(kind, concrete), witness)
}

pub fn le(mgr: &mut WitnessManager, kind: ValueKind, sign: SignKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let g = gt(mgr, kind, sign, a, b);
    negate_bool(mgr, g, kind)
}

pub fn ge(mgr: &mut WitnessManager, kind: ValueKind, sign: SignKind, a: TracedValue, b: TracedValue) -> TracedValue {
    let l = lt(mgr, kind, sign, a, b);
    negate_bool(mgr, l, kind)
}

/// Sign-extend the low 8 bits of `a` to the full width of `kind`.
pub fn extend8_s(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue) -> TracedValue {
    sign_extend(mgr, kind, a, 8)
}

/// Sign-extend the low 16 bits of `a` to the full width of `kind`.
pub fn extend16_s(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue) -> TracedValue {
    sign_extend(mgr, kind, a, 16)
}

/// `i64.extend32_s`: sign-extend the low 32 bits of an `i64`.
pub fn extend32_s(mgr: &mut WitnessManager, a: TracedValue) -> TracedValue {
    sign_extend(mgr, ValueKind::I64, a, 32)
}

fn sign_extend(mgr: &mut WitnessManager, kind: ValueKind, a: TracedValue, from_bits: u32) -> TracedValue {
    let width = kind.bits() as u32;
    // Decompose the *full* source width — `a` may carry nonzero bits above
    // `from_bits` that must be discarded, not mistaken for part of the value
    // being sign-extended.
    let mut bits = bit_decompose(mgr, a.witness, width);
    let sign_bit = bits.get((from_bits - 1) as usize);
    mgr.retain(sign_bit);
    bits.drop_msb(mgr, (width - from_bits) as usize);
    let low = bit_compose(mgr, &bits);
    bits.release_all(mgr);
    mgr.release(a.witness);

    // high = sign_bit * (2^width - 2^from_bits)
    let fill = Scalar::one().shl_mod(width) - Scalar::one().shl_mod(from_bits);
    let high = eval(mgr, &Expr::scale(Expr::witness(sign_bit), fill));
    mgr.release(sign_bit);
    let witness = eval(mgr, &Expr::add(Expr::witness(low), Expr::witness(high)));
    mgr.release(low);
    mgr.release(high);

    let shift = 64 - from_bits;
    let raw = a.value.as_u64();
    let extended = ((raw << shift) as i64 >> shift) as u64 & mask(width);
    TracedValue::new(concrete_of(kind, extended), witness)
}

/// `i64.extend_i32_s` / `i64.extend_i32_u`.
pub fn extend_i32(mgr: &mut WitnessManager, sign: SignKind, a: TracedValue) -> TracedValue {
    match sign {
        SignKind::Unsigned => TracedValue::new(Value::I64(i64::from(a.value.as_u64() as u32)), a.witness),
        SignKind::Signed => sign_extend(mgr, ValueKind::I64, a, 32),
    }
}

/// `i32.wrap_i64`: truncate to the low 32 bits.
pub fn wrap_i64(mgr: &mut WitnessManager, a: TracedValue) -> TracedValue {
    let witness = wrap_low_bits(mgr, a.witness, 64, 32);
    TracedValue::new(Value::I32(a.value.as_u64() as u32 as i32), witness)
}
