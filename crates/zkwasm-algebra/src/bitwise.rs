//! Bitwise combinators over boolean witnesses: xor, xnor, equality-to-zero,
//! equality, and an MSB-down ripple comparator.
//!
//! Grounded on `core.hpp`'s `bitwise_xor`/`bitwise_xnor`/`bitwise_eqz`/
//! `bitwise_eq`/`bitwise_gt`. Each is built from the same AND/NOT primitives
//! the expression DSL already provides; `bitwise_xor`/`bitwise_xnor`/
//! `bitwise_eqz`/`bitwise_eq` fold into a single [`Expr`] tree and evaluate
//! it once, while `bitwise_gt` threads a running `(gt, eq)` pair bit by bit
//! since each step's result depends on the materialized value of the last.

use crate::expr::{eval, Expr};
use crate::bits::DecomposedBits;
use zkwasm_field::Scalar;
use zkwasm_witness::{WitnessId, WitnessManager};

fn xor_expr(x: WitnessId, y: WitnessId) -> Expr {
    Expr::sub(
        Expr::add(Expr::witness(x), Expr::witness(y)),
        Expr::scale(Expr::bitand(Expr::witness(x), Expr::witness(y)), Scalar::from_u64(2)),
    )
}

fn xnor_expr(x: WitnessId, y: WitnessId) -> Expr {
    Expr::bitnot(xor_expr(x, y))
}

/// `x XOR y` over two boolean witnesses.
pub fn bitwise_xor(mgr: &mut WitnessManager, x: WitnessId, y: WitnessId) -> WitnessId {
    eval(mgr, &xor_expr(x, y))
}

/// `x XNOR y` (bitwise equality) over two boolean witnesses.
pub fn bitwise_xnor(mgr: &mut WitnessManager, x: WitnessId, y: WitnessId) -> WitnessId {
    eval(mgr, &xnor_expr(x, y))
}

/// Flip every bit of a decomposed value, producing a fresh `DecomposedBits`;
/// the input bits are left exactly as owned as they were (not consumed).
pub fn bitwise_not_bits(mgr: &mut WitnessManager, bits: &DecomposedBits) -> Vec<WitnessId> {
    (0..bits.len())
        .map(|i| eval(mgr, &Expr::bitnot(Expr::witness(bits.get(i)))))
        .collect()
}

/// `1` iff every bit of `bits` is zero.
///
/// # Panics
/// Panics if `bits` is empty.
pub fn bitwise_eqz(mgr: &mut WitnessManager, bits: &DecomposedBits) -> WitnessId {
    assert!(!bits.is_empty(), "bitwise_eqz: empty operand");
    let mut acc = Expr::bitnot(Expr::witness(bits.get(0)));
    for i in 1..bits.len() {
        acc = Expr::bitand(acc, Expr::bitnot(Expr::witness(bits.get(i))));
    }
    eval(mgr, &acc)
}

/// `1` iff `x` and `y` are bitwise equal (same width).
///
/// # Panics
/// Panics if the two operands have different widths.
pub fn bitwise_eq(mgr: &mut WitnessManager, x: &DecomposedBits, y: &DecomposedBits) -> WitnessId {
    assert_eq!(x.len(), y.len(), "bitwise_eq: width mismatch");
    assert!(!x.is_empty(), "bitwise_eq: empty operand");
    let mut acc = xnor_expr(x.get(0), y.get(0));
    for i in 1..x.len() {
        acc = Expr::bitand(acc, xnor_expr(x.get(i), y.get(i)));
    }
    eval(mgr, &acc)
}

/// `1` iff the unsigned integer represented by `x` (MSB at the last index)
/// is strictly greater than that of `y`. Implemented as an MSB-down ripple:
/// at each step, `gt' = gt OR (eq AND x_i AND NOT y_i)` and
/// `eq' = eq AND (x_i XNOR y_i)`, starting from the top bit.
///
/// # Panics
/// Panics if the two operands have different widths, or either is empty.
pub fn bitwise_gt(mgr: &mut WitnessManager, x: &DecomposedBits, y: &DecomposedBits) -> WitnessId {
    assert_eq!(x.len(), y.len(), "bitwise_gt: width mismatch");
    let n = x.len();
    assert!(n > 0, "bitwise_gt: empty operand");

    let top = n - 1;
    let mut gt = eval(
        mgr,
        &Expr::bitand(Expr::witness(x.get(top)), Expr::bitnot(Expr::witness(y.get(top)))),
    );
    let mut eq = eval(mgr, &xnor_expr(x.get(top), y.get(top)));

    for i in (0..top).rev() {
        let (xi, yi) = (x.get(i), y.get(i));

        let gt_i = eval(mgr, &Expr::bitand(Expr::witness(xi), Expr::bitnot(Expr::witness(yi))));
        let candidate = eval(mgr, &Expr::bitand(Expr::witness(eq), Expr::witness(gt_i)));
        mgr.release(gt_i);
        // OR via a + b - a*b (gt and candidate need not be disjoint in general).
        let new_gt = eval(
            mgr,
            &Expr::sub(
                Expr::add(Expr::witness(gt), Expr::witness(candidate)),
                Expr::mul(Expr::witness(gt), Expr::witness(candidate)),
            ),
        );
        mgr.release(gt);
        mgr.release(candidate);

        let eqi = eval(mgr, &xnor_expr(xi, yi));
        let new_eq = eval(mgr, &Expr::bitand(Expr::witness(eq), Expr::witness(eqi)));
        mgr.release(eq);
        mgr.release(eqi);

        gt = new_gt;
        eq = new_eq;
    }
    mgr.release(eq);
    gt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::bit_decompose;

    fn mgr() -> WitnessManager {
        WitnessManager::new(16, 32, [5u8; 32])
    }

    #[test]
    fn xor_matches_native() {
        let mut mgr = mgr();
        let a = mgr.acquire_witness(Scalar::one());
        let b = mgr.acquire_witness(Scalar::zero());
        let w = bitwise_xor(&mut mgr, a, b);
        assert_eq!(mgr.value_of(w), Scalar::one());
        mgr.release(a);
        mgr.release(b);
        mgr.release(w);
        mgr.finalize();
    }

    #[test]
    fn eqz_true_only_for_all_zero_bits() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::zero());
        let mut bits = bit_decompose(&mut mgr, x, 4);
        let w = bitwise_eqz(&mut mgr, &bits);
        assert_eq!(mgr.value_of(w), Scalar::one());
        mgr.release(x);
        mgr.release(w);
        bits.release_all(&mut mgr);
        mgr.finalize();
    }

    #[test]
    fn eq_detects_equal_operands() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(0b1100));
        let y = mgr.acquire_witness(Scalar::from_u64(0b1100));
        let mut xb = bit_decompose(&mut mgr, x, 4);
        let mut yb = bit_decompose(&mut mgr, y, 4);
        let w = bitwise_eq(&mut mgr, &xb, &yb);
        assert_eq!(mgr.value_of(w), Scalar::one());
        mgr.release(x);
        mgr.release(y);
        mgr.release(w);
        xb.release_all(&mut mgr);
        yb.release_all(&mut mgr);
        mgr.finalize();
    }

    #[test]
    fn gt_orders_unsigned_values() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(9));
        let y = mgr.acquire_witness(Scalar::from_u64(5));
        let mut xb = bit_decompose(&mut mgr, x, 4);
        let mut yb = bit_decompose(&mut mgr, y, 4);
        let w = bitwise_gt(&mut mgr, &xb, &yb);
        assert_eq!(mgr.value_of(w), Scalar::one());
        mgr.release(x);
        mgr.release(y);
        mgr.release(w);
        xb.release_all(&mut mgr);
        yb.release_all(&mut mgr);
        mgr.finalize();
    }

    #[test]
    fn gt_false_when_not_strictly_greater() {
        let mut mgr = mgr();
        let x = mgr.acquire_witness(Scalar::from_u64(5));
        let y = mgr.acquire_witness(Scalar::from_u64(5));
        let mut xb = bit_decompose(&mut mgr, x, 4);
        let mut yb = bit_decompose(&mut mgr, y, 4);
        let w = bitwise_gt(&mut mgr, &xb, &yb);
        assert_eq!(mgr.value_of(w), Scalar::zero());
        mgr.release(x);
        mgr.release(y);
        mgr.release(w);
        xb.release_all(&mut mgr);
        yb.release_all(&mut mgr);
        mgr.finalize();
    }
}
