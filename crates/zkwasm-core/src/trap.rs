//! Trap taxonomy and the three-way opcode execution outcome.
//!
//! Per REDESIGN FLAGS: replaces exception-based trap signalling with a
//! sum-typed result threaded up the interpreter's recursion instead of
//! unwinding the host call stack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an opcode trapped. Every variant here is a dead end for the current
/// proof attempt (spec §7: traps are never retried).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum TrapReason {
    /// `unreachable` was executed.
    #[error("unreachable executed")]
    Unreachable,
    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Division overflow (`i32::MIN / -1`, `i64::MIN / -1`).
    #[error("integer overflow")]
    IntegerOverflow,
    /// Memory access outside the linear memory's current bounds.
    #[error("out of bounds memory access")]
    MemoryOutOfBounds,
    /// Table access outside the table's current bounds.
    #[error("out of bounds table access")]
    TableOutOfBounds,
    /// A `call_indirect` type mismatch, or any other operand/type mismatch.
    #[error("type mismatch")]
    TypeMismatch,
    /// `call_indirect` through a null or out-of-range table slot.
    #[error("uninitialized element")]
    UninitializedElement,
    /// A host call failed to convert or parse its arguments.
    #[error("host conversion error: {0}")]
    HostConversion(String),
    /// An imported module or field name could not be resolved.
    #[error("unknown import: {0}")]
    UnknownImport(String),
}

/// The outcome of executing one opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecResult {
    /// Continue to the next opcode.
    Ok,
    /// Unwind `n` labels (branch target).
    Branch(u32),
    /// Abandon the current proof attempt.
    Trap(TrapReason),
}

impl ExecResult {
    /// Construct the common case.
    #[must_use]
    pub const fn ok() -> Self {
        ExecResult::Ok
    }

    /// True if this is a trap.
    #[must_use]
    pub const fn is_trap(&self) -> bool {
        matches!(self, ExecResult::Trap(_))
    }
}
