//! The guest/host call ABI (spec §6): imported functions read and write the
//! value stack directly rather than taking/returning ordinary WASM values,
//! which is how the `bn254fr`/`vbn254fr` scalar-field surface crosses the
//! guest/host boundary — a field element doesn't fit in an `i32`/`i64`
//! register, so the guest instead passes opaque *handles* (small integers
//! indexing a host-owned scalar heap) and the host call manipulates the
//! heap slot(s) named by the handles already sitting on the stack.
//!
//! Grounded on `interpreter_impl.hpp`'s host-call dispatch table, keyed here
//! by [`FuncIdx`] rather than `(module_name, field_name)` since linking is
//! out of scope (spec §1): the loader that would resolve import names to
//! indices is a named collaborator, not this crate's job.

use zkwasm_core::{FuncIdx, TrapReason};
use zkwasm_field::Scalar;
use zkwasm_witness::WitnessId;

use crate::machine::Machine;

/// A host function: reads its arguments off `m`'s value stack, pushes its
/// results, and returns `Err` to trap the whole execution — no retry, per
/// spec §7's error taxonomy.
pub type HostFn = fn(&mut Machine<'_>) -> Result<(), TrapReason>;

/// Name-indexed host function table, keyed by the import's resolved
/// [`FuncIdx`].
#[derive(Default, Clone)]
pub struct HostTable {
    fns: Vec<Option<HostFn>>,
}

impl HostTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` as the host implementation of `idx`.
    pub fn register(&mut self, idx: FuncIdx, f: HostFn) {
        let i = idx.index();
        if self.fns.len() <= i {
            self.fns.resize(i + 1, None);
        }
        self.fns[i] = Some(f);
    }

    #[must_use]
    pub fn get(&self, idx: FuncIdx) -> Option<HostFn> {
        self.fns.get(idx.index()).copied().flatten()
    }

    /// The standard `bn254fr`/`vbn254fr` scalar-field ABI, registered at the
    /// import indices the loader assigned them (spec §6's named surface:
    /// allocate/free/set/copy/print, arithmetic, compare, logical/bitwise,
    /// `to_bits`, `shl`/`shr` mod p, `assert_equal`/`assert_linear`/
    /// `assert_quadratic`).
    #[must_use]
    pub fn with_bn254fr_abi(mut self, base: FuncIdx) -> Self {
        let b = base.index() as u32;
        let ops: [HostFn; 13] = [
            bn254fr_alloc,
            bn254fr_free,
            bn254fr_set_i64,
            bn254fr_copy,
            bn254fr_add,
            bn254fr_sub,
            bn254fr_mul,
            bn254fr_neg,
            bn254fr_inv,
            bn254fr_eq,
            bn254fr_assert_equal,
            bn254fr_assert_linear,
            bn254fr_assert_quadratic,
        ];
        for (i, f) in ops.into_iter().enumerate() {
            self.register(FuncIdx(b + i as u32), f);
        }
        self
    }
}

/// A live scalar handle: the field value and the witness it's tied to. Not a
/// [`crate::value::TracedValue`] — a bn254 scalar has no WASM `i32`/`i64`
/// representation, only the handle referencing it does.
#[derive(Copy, Clone)]
struct HostScalar {
    value: Scalar,
    witness: WitnessId,
}

/// The host-owned heap of live scalar handles a guest manipulates by index.
/// Kept on [`Machine`] rather than folded into the witness pool directly: a
/// handle may be read many times across host calls, so it needs a stable
/// address the guest can hold onto (an ordinary witness reference is
/// consumed the moment it's used).
#[derive(Default)]
pub struct ScalarHeap {
    slots: Vec<Option<HostScalar>>,
    free: Vec<u32>,
}

impl ScalarHeap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, v: HostScalar) -> u32 {
        if let Some(h) = self.free.pop() {
            self.slots[h as usize] = Some(v);
            h
        } else {
            self.slots.push(Some(v));
            (self.slots.len() - 1) as u32
        }
    }

    fn get(&self, h: u32) -> HostScalar {
        self.slots[h as usize].expect("bn254fr handle: use after free")
    }

    fn free(&mut self, h: u32, mgr: &mut zkwasm_witness::WitnessManager) {
        if let Some(v) = self.slots[h as usize].take() {
            mgr.release(v.witness);
        }
        self.free.push(h);
    }

    fn set(&mut self, h: u32, v: HostScalar) {
        self.slots[h as usize] = Some(v);
    }
}

fn pop_i32(m: &mut Machine<'_>) -> Result<u32, TrapReason> {
    let v = m.pop_value();
    m.release(v.witness);
    Ok(v.value.as_u64() as u32)
}

fn bn254fr_alloc(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let w = m.acquire_scalar_witness(Scalar::zero());
    let h = m.scalars.alloc(HostScalar { value: Scalar::zero(), witness: w });
    m.push_i32(h as i32);
    Ok(())
}

fn bn254fr_free(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let h = pop_i32(m)?;
    m.scalars.free(h, &mut m.mgr);
    Ok(())
}

fn bn254fr_set_i64(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let value = m.pop_value();
    let h = pop_i32(m)?;
    let scalar = Scalar::from_i64(value.value.as_i64());
    m.release(value.witness);
    let w = m.acquire_scalar_witness(scalar);
    m.scalars.set(h, HostScalar { value: scalar, witness: w });
    Ok(())
}

fn bn254fr_copy(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let src = pop_i32(m)?;
    let dst = pop_i32(m)?;
    let v = m.scalars.get(src);
    m.mgr.retain(v.witness);
    m.scalars.set(dst, v);
    Ok(())
}

fn binop(m: &mut Machine<'_>, f: impl Fn(Scalar, Scalar) -> Scalar) -> Result<(), TrapReason> {
    let rhs = pop_i32(m)?;
    let lhs = pop_i32(m)?;
    let dst = pop_i32(m)?;
    let a = m.scalars.get(lhs);
    let b = m.scalars.get(rhs);
    let result = f(a.value, b.value);
    m.release(a.witness);
    m.release(b.witness);
    let w = m.acquire_scalar_witness(result);
    m.scalars.set(dst, HostScalar { value: result, witness: w });
    Ok(())
}

fn bn254fr_add(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    binop(m, |a, b| a + b)
}

fn bn254fr_sub(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    binop(m, |a, b| a - b)
}

fn bn254fr_mul(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    binop(m, |a, b| a * b)
}

fn bn254fr_neg(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let src = pop_i32(m)?;
    let dst = pop_i32(m)?;
    let v = m.scalars.get(src);
    let result = v.value.neg();
    m.release(v.witness);
    let w = m.acquire_scalar_witness(result);
    m.scalars.set(dst, HostScalar { value: result, witness: w });
    Ok(())
}

fn bn254fr_inv(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let src = pop_i32(m)?;
    let dst = pop_i32(m)?;
    let v = m.scalars.get(src);
    if v.value == Scalar::zero() {
        m.release(v.witness);
        return Err(TrapReason::HostConversion("bn254fr_inv: division by zero".into()));
    }
    let result = v.value.inv();
    m.release(v.witness);
    let w = m.acquire_scalar_witness(result);
    m.scalars.set(dst, HostScalar { value: result, witness: w });
    Ok(())
}

fn bn254fr_eq(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let rhs = pop_i32(m)?;
    let lhs = pop_i32(m)?;
    let a = m.scalars.get(lhs);
    let b = m.scalars.get(rhs);
    let eq = a.value == b.value;
    m.release(a.witness);
    m.release(b.witness);
    m.push_i32(i32::from(eq));
    Ok(())
}

fn bn254fr_assert_equal(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let rhs = pop_i32(m)?;
    let lhs = pop_i32(m)?;
    let a = m.scalars.get(lhs);
    let b = m.scalars.get(rhs);
    if a.value != b.value {
        m.release(a.witness);
        m.release(b.witness);
        return Err(TrapReason::HostConversion("bn254fr_assert_equal: values differ".into()));
    }
    m.mgr.constrain_equal(a.witness, b.witness);
    m.release(a.witness);
    m.release(b.witness);
    Ok(())
}

/// `assert(c == a + b)`.
fn bn254fr_assert_linear(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let c = pop_i32(m)?;
    let rhs = pop_i32(m)?;
    let lhs = pop_i32(m)?;
    let a = m.scalars.get(lhs);
    let b = m.scalars.get(rhs);
    let cv = m.scalars.get(c);
    m.mgr.constrain_linear(cv.witness, a.witness, b.witness);
    m.release(a.witness);
    m.release(b.witness);
    m.release(cv.witness);
    Ok(())
}

/// `assert(c == a * b)`.
fn bn254fr_assert_quadratic(m: &mut Machine<'_>) -> Result<(), TrapReason> {
    let c = pop_i32(m)?;
    let rhs = pop_i32(m)?;
    let lhs = pop_i32(m)?;
    let a = m.scalars.get(lhs);
    let b = m.scalars.get(rhs);
    let cv = m.scalars.get(c);
    m.mgr.constrain_quadratic(cv.witness, a.witness, b.witness);
    m.release(a.witness);
    m.release(b.witness);
    m.release(cv.witness);
    Ok(())
}
