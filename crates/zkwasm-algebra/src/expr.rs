//! The linear/quadratic expression tree and its two evaluation modes.
//!
//! Grounded on `core.hpp`'s `zkexpr<Op, Args...>` template and its
//! `eval_impl` overloads. That design gets two evaluation entry points per
//! node: a materializing `eval` that returns a `managed_witness`, and an
//! internal `eval(ctx, result, rand)` that threads a signed random term
//! through purely-linear subtrees (`Add`/`Sub`/`Constant`/`Witness`/`BitNot`)
//! without separately committing them. [`eval`] and [`eval_inner`] below are
//! that same split, adapted to pooled `WitnessId` handles instead of
//! shared-pointer-counted nodes.
//!
//! Every retain performed while evaluating a node is balanced by a release
//! within the *same* call: [`eval`]'s `Witness` leaf retains and hands back a
//! temporary extra reference, and [`Expr::Mul`]/[`Expr::BitAnd`] release
//! whatever their operand's `eval` produced — so using the same `WitnessId`
//! in several places in one expression (or across several expressions) never
//! consumes the caller's own reference to it. [`eval_inner`]'s `Witness` leaf
//! never touches the refcount at all: it is a pure read, tying randomness
//! without creating or releasing anything.

use zkwasm_field::Scalar;
use zkwasm_witness::{WitnessId, WitnessManager};

/// A linear/quadratic combination over witnesses and compile-time constants.
#[derive(Clone, Debug)]
pub enum Expr {
    /// A pooled witness, read by value.
    Witness(WitnessId),
    /// A compile-time constant.
    Constant(Scalar),
    /// `x + y`.
    Add(Box<Expr>, Box<Expr>),
    /// `x - y`.
    Sub(Box<Expr>, Box<Expr>),
    /// `x * k` for a compile-time constant `k` — handled as a pure linear
    /// scaling (`constrain_quadratic_constant`), never a quadratic
    /// constraint, mirroring `core.hpp`'s specialized multiply-by-constant
    /// `eval_impl` overload.
    Scale(Box<Expr>, Scalar),
    /// `x * y`, a genuine quadratic constraint between two witness values.
    Mul(Box<Expr>, Box<Expr>),
    /// `x & y`, constrained the same way as `Mul` (valid only when both
    /// operands are boolean).
    BitAnd(Box<Expr>, Box<Expr>),
    /// `1 - x` (valid only when `x` is boolean).
    BitNot(Box<Expr>),
}

impl Expr {
    #[must_use]
    pub fn witness(id: WitnessId) -> Self {
        Self::Witness(id)
    }

    #[must_use]
    pub fn constant(v: Scalar) -> Self {
        Self::Constant(v)
    }

    #[must_use]
    pub fn add(x: Self, y: Self) -> Self {
        Self::Add(Box::new(x), Box::new(y))
    }

    #[must_use]
    pub fn sub(x: Self, y: Self) -> Self {
        Self::Sub(Box::new(x), Box::new(y))
    }

    #[must_use]
    pub fn scale(x: Self, k: Scalar) -> Self {
        Self::Scale(Box::new(x), k)
    }

    #[must_use]
    pub fn mul(x: Self, y: Self) -> Self {
        Self::Mul(Box::new(x), Box::new(y))
    }

    #[must_use]
    pub fn bitand(x: Self, y: Self) -> Self {
        Self::BitAnd(Box::new(x), Box::new(y))
    }

    #[must_use]
    pub fn bitnot(x: Self) -> Self {
        Self::BitNot(Box::new(x))
    }
}

/// Materialize `expr` into a freshly committed (or borrowed, for a bare
/// witness leaf) witness.
pub fn eval(mgr: &mut WitnessManager, expr: &Expr) -> WitnessId {
    match expr {
        Expr::Witness(id) => {
            mgr.retain(*id);
            *id
        }
        Expr::Constant(v) => {
            let w = mgr.acquire_witness(*v);
            mgr.constrain_constant(w, *v);
            w
        }
        Expr::Add(x, y) => {
            let wit = mgr.acquire_witness(Scalar::zero());
            let rand = mgr.next_linear_random();
            mgr.witness_sub_random(wit, rand);
            let xv = eval_inner(mgr, x, rand);
            let yv = eval_inner(mgr, y, rand);
            mgr.set_value(wit, xv + yv);
            wit
        }
        Expr::Sub(x, y) => {
            let wit = mgr.acquire_witness(Scalar::zero());
            let rand = mgr.next_linear_random();
            mgr.witness_sub_random(wit, rand);
            let xv = eval_inner(mgr, x, rand);
            let yv = eval_inner(mgr, y, rand.neg());
            mgr.set_value(wit, xv - yv);
            wit
        }
        Expr::Scale(x, k) => {
            let wit = mgr.acquire_witness(Scalar::zero());
            let rand = mgr.next_linear_random();
            mgr.witness_sub_random(wit, rand);
            let xv = eval_inner(mgr, x, rand * *k);
            mgr.set_value(wit, xv * *k);
            wit
        }
        Expr::Mul(x, y) => {
            let xw = eval(mgr, x);
            let yw = eval(mgr, y);
            let zv = mgr.value_of(xw) * mgr.value_of(yw);
            let zw = mgr.acquire_witness(zv);
            mgr.constrain_quadratic(zw, xw, yw);
            mgr.release(xw);
            mgr.release(yw);
            zw
        }
        Expr::BitAnd(x, y) => {
            let xw = eval(mgr, x);
            let yw = eval(mgr, y);
            let xv = mgr.value_of(xw);
            let yv = mgr.value_of(yw);
            debug_assert!(xv == Scalar::zero() || xv == Scalar::one(), "BitAnd operand not boolean");
            debug_assert!(yv == Scalar::zero() || yv == Scalar::one(), "BitAnd operand not boolean");
            let zv = if xv == Scalar::one() && yv == Scalar::one() {
                Scalar::one()
            } else {
                Scalar::zero()
            };
            let zw = mgr.acquire_witness(zv);
            mgr.constrain_quadratic(zw, xw, yw);
            mgr.release(xw);
            mgr.release(yw);
            zw
        }
        Expr::BitNot(x) => {
            let wit = mgr.acquire_witness(Scalar::zero());
            let rand = mgr.next_linear_random();
            mgr.witness_sub_random(wit, rand);
            let xv = eval_inner(mgr, x, rand.neg());
            debug_assert!(xv == Scalar::zero() || xv == Scalar::one(), "BitNot operand not boolean");
            mgr.set_value(wit, Scalar::one() - xv);
            mgr.constsum_add(rand);
            wit
        }
    }
}

/// Thread `rand` through a purely-linear subtree without materializing any
/// of its nodes, returning the concrete value. Falls back to [`eval`] (which
/// does materialize, and is released again here) once it hits a genuinely
/// quadratic node.
fn eval_inner(mgr: &mut WitnessManager, expr: &Expr, rand: Scalar) -> Scalar {
    match expr {
        Expr::Witness(id) => {
            mgr.witness_add_random(*id, rand);
            mgr.value_of(*id)
        }
        Expr::Constant(v) => {
            mgr.constsum_add(rand * *v);
            *v
        }
        Expr::Add(x, y) => eval_inner(mgr, x, rand) + eval_inner(mgr, y, rand),
        Expr::Sub(x, y) => eval_inner(mgr, x, rand) - eval_inner(mgr, y, rand.neg()),
        Expr::Scale(x, k) => eval_inner(mgr, x, rand * *k) * *k,
        Expr::BitNot(x) => {
            let xv = eval_inner(mgr, x, rand.neg());
            mgr.constsum_add(rand);
            Scalar::one() - xv
        }
        Expr::Mul(..) | Expr::BitAnd(..) => {
            let zw = eval(mgr, expr);
            let zv = mgr.value_of(zw);
            mgr.witness_add_random(zw, rand);
            mgr.release(zw);
            zv
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mgr() -> WitnessManager {
        WitnessManager::new(8, 16, [3u8; 32])
    }

    #[test]
    fn add_matches_concrete_sum() {
        let mut mgr = mgr();
        let a = mgr.acquire_witness(Scalar::from_u64(3));
        let b = mgr.acquire_witness(Scalar::from_u64(4));
        let w = eval(&mut mgr, &Expr::add(Expr::witness(a), Expr::witness(b)));
        assert_eq!(mgr.value_of(w), Scalar::from_u64(7));
        mgr.release(a);
        mgr.release(b);
        mgr.release(w);
        mgr.finalize();
    }

    #[test]
    fn mul_matches_concrete_product() {
        let mut mgr = mgr();
        let a = mgr.acquire_witness(Scalar::from_u64(6));
        let b = mgr.acquire_witness(Scalar::from_u64(7));
        let w = eval(&mut mgr, &Expr::mul(Expr::witness(a), Expr::witness(b)));
        assert_eq!(mgr.value_of(w), Scalar::from_u64(42));
        mgr.release(a);
        mgr.release(b);
        mgr.release(w);
        mgr.finalize();
    }

    #[test]
    fn reusing_a_witness_across_subexpressions_does_not_leak_or_double_free() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::one());
        let y = mgr.acquire_witness(Scalar::zero());
        // (x + y) - 2*(x & y): reuses x and y in both a linear and a
        // quadratic position within the same expression.
        let expr = Expr::sub(
            Expr::add(Expr::witness(x), Expr::witness(y)),
            Expr::scale(Expr::bitand(Expr::witness(x), Expr::witness(y)), Scalar::from_u64(2)),
        );
        let w = eval(&mut mgr, &expr);
        assert_eq!(mgr.value_of(w), Scalar::one());
        mgr.release(x);
        mgr.release(y);
        mgr.release(w);
        mgr.finalize();
    }

    #[test]
    fn scale_is_linear_and_does_not_materialize_its_operand() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(5));
        let w = eval(&mut mgr, &Expr::scale(Expr::witness(x), Scalar::from_u64(3)));
        assert_eq!(mgr.value_of(w), Scalar::from_u64(15));
        mgr.release(x);
        mgr.release(w);
        mgr.finalize();
    }
}
