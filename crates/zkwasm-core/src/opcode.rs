//! The flat opcode taxonomy and the fixed-width instruction record the
//! interpreter dispatches on.
//!
//! Per REDESIGN FLAGS: collapses what was originally a SFINAE-dispatched,
//! deeply templated opcode hierarchy into one enumerated `OpKind` with a
//! 4-wide integer operand record. The WAT/WASM parser that produces this
//! stream is out of scope; this module only fixes the shape it hands the
//! interpreter.

use serde::{Deserialize, Serialize};

/// Numeric value kind (WASM MVP integer types only; floats are a Non-goal).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// 32-bit integer.
    I32,
    /// 64-bit integer.
    I64,
}

impl ValueKind {
    /// Bit width of this kind.
    #[must_use]
    pub const fn bits(self) -> usize {
        match self {
            ValueKind::I32 => 32,
            ValueKind::I64 => 64,
        }
    }
}

/// Signedness tag for opcodes whose semantics depend on it (div/rem/shr/cmp).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignKind {
    /// Signed interpretation.
    Signed,
    /// Unsigned interpretation.
    Unsigned,
}

/// Flat enumeration of every opcode the interpreter dispatches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum OpKind {
    // --- stack / misc ---
    Unreachable,
    Nop,
    Drop,
    Select,
    InnConst,

    // --- numeric, one-operand ---
    InnClz,
    InnCtz,
    InnPopcnt,
    Extend8S,
    Extend16S,
    I64Extend32S,
    I64ExtendI32,
    I32WrapI64,
    InnEqz,

    // --- numeric, two-operand ---
    InnAdd,
    InnSub,
    InnMul,
    InnDivSx,
    InnRemSx,
    InnAnd,
    InnOr,
    InnXor,
    InnShl,
    InnShrSx,
    InnRotl,
    InnRotr,
    InnEq,
    InnNe,
    InnLtSx,
    InnGtSx,
    InnLeSx,
    InnGeSx,

    // --- variables ---
    LocalGet,
    LocalSet,
    LocalTee,
    GlobalGet,
    GlobalSet,

    // --- control flow ---
    Block,
    Loop,
    If,
    Else,
    End,
    Br,
    BrIf,
    BrTable,
    Return,
    Call,
    CallIndirect,

    // --- table ---
    TableGet,
    TableSet,
    TableSize,
    TableGrow,
    TableFill,
    TableCopy,
    TableInit,
    ElemDrop,

    // --- memory ---
    Load,
    Store,
    MemorySize,
    MemoryGrow,
    MemoryFill,
    MemoryCopy,
    MemoryInit,
    DataDrop,

    // --- reference ---
    RefNull,
    RefIsNull,
    RefFunc,
}

/// The fixed-width instruction record: an opcode kind plus four integer
/// operand slots whose meaning depends on `kind` (type/sign/align/offset for
/// a numeric op, local index for `local.get`, branch depth for `br`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opcode {
    /// Which operation this record performs.
    pub kind: OpKind,
    /// First operand (commonly: value kind, as 0=I32 / 1=I64).
    pub a: u32,
    /// Second operand (commonly: signedness, as 0=unsigned / 1=signed).
    pub b: u32,
    /// Third operand (commonly: memory alignment, local/global index).
    pub c: u32,
    /// Fourth operand (commonly: memory offset, branch target depth).
    pub d: u32,
}

impl Opcode {
    /// Decode the `(type, sign, align, offset)` quadruple used by numeric
    /// and memory opcodes.
    #[must_use]
    pub fn decode_numeric(self) -> (ValueKind, SignKind, u32, u32) {
        let ty = if self.a == 0 {
            ValueKind::I32
        } else {
            ValueKind::I64
        };
        let sign = if self.b == 0 {
            SignKind::Unsigned
        } else {
            SignKind::Signed
        };
        (ty, sign, self.c, self.d)
    }

    /// Decode a `const` opcode's `(type, immediate)` pair. The immediate is
    /// carried across `c`/`d` as a little-endian 64-bit value.
    #[must_use]
    pub fn decode_const(self) -> (ValueKind, i64) {
        let ty = if self.a == 0 {
            ValueKind::I32
        } else {
            ValueKind::I64
        };
        let imm = (u64::from(self.c) | (u64::from(self.d) << 32)) as i64;
        (ty, imm)
    }
}
