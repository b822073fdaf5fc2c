//! Module-instance addressing and value types shared across the interpreter,
//! the algebraic backend, and the execution contexts.
//!
//! The binary/text parser that produces a [`FuncType`] table and the initial
//! table/global/data contents from a `.wasm`/`.wat` file is out of scope
//! (spec §1, named collaborator); this module only fixes the shapes those
//! parsers hand to the rest of the system.

use crate::opcode::ValueKind;
use serde::{Deserialize, Serialize};

/// Index newtype macro: every WASM index space (func/table/mem/global/type/
/// elem/data) is a `u32` but they must never be interchanged.
macro_rules! index_newtype {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// The raw index value.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

index_newtype!(FuncIdx);
index_newtype!(TableIdx);
index_newtype!(MemIdx);
index_newtype!(GlobalIdx);
index_newtype!(TypeIdx);
index_newtype!(ElemIdx);
index_newtype!(DataIdx);
index_newtype!(LocalIdx);
index_newtype!(LabelIdx);

/// A concrete (non-witness) runtime value. Floats/vectors are a Non-goal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// 32-bit integer, stored sign-agnostic as its bit pattern.
    I32(i32),
    /// 64-bit integer, stored sign-agnostic as its bit pattern.
    I64(i64),
}

impl Value {
    /// The [`ValueKind`] of this value.
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
        }
    }

    /// Widen to an `i64`, sign-extending `I32`.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Value::I32(v) => v as i64,
            Value::I64(v) => v,
        }
    }

    /// Widen to a `u64`, zero-extending `I32`'s bit pattern.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        match self {
            Value::I32(v) => (v as u32) as u64,
            Value::I64(v) => v as u64,
        }
    }
}

/// A reference value: either a function reference or an external reference.
/// `None` encodes `ref.null`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefValue {
    /// A (possibly null) function reference.
    FuncRef(Option<FuncIdx>),
    /// A (possibly null) opaque external reference, host-defined.
    ExternRef(Option<u32>),
}

impl RefValue {
    /// True for `ref.null`.
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self, RefValue::FuncRef(None) | RefValue::ExternRef(None))
    }
}

/// A function signature: ordered parameter and result kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncType {
    /// Parameter kinds, in call order.
    pub params: Vec<ValueKind>,
    /// Result kinds, in return order.
    pub results: Vec<ValueKind>,
}

/// Element-count bounds for a table or memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Minimum size.
    pub min: u32,
    /// Optional maximum size.
    pub max: Option<u32>,
}

/// A runtime table instance: a vector of reference-typed slots.
#[derive(Clone, Debug)]
pub struct TableInstance {
    elements: Vec<RefValue>,
    limits: Limits,
}

impl TableInstance {
    /// Construct a table of `limits.min` null elements.
    #[must_use]
    pub fn new(limits: Limits, default: RefValue) -> Self {
        Self {
            elements: vec![default; limits.min as usize],
            limits,
        }
    }

    /// Current number of slots.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    /// Read a slot.
    #[must_use]
    pub fn get(&self, idx: u32) -> Option<RefValue> {
        self.elements.get(idx as usize).copied()
    }

    /// Write a slot.
    pub fn set(&mut self, idx: u32, value: RefValue) -> Option<()> {
        *self.elements.get_mut(idx as usize)? = value;
        Some(())
    }

    /// Grow by `delta` slots filled with `fill`. Returns the previous size,
    /// or `None` if growth would exceed `limits.max`.
    pub fn grow(&mut self, delta: u32, fill: RefValue) -> Option<u32> {
        let prev = self.size();
        let next = prev.checked_add(delta)?;
        if let Some(max) = self.limits.max {
            if next > max {
                return None;
            }
        }
        self.elements.resize(next as usize, fill);
        Some(prev)
    }

    /// Fill `len` slots starting at `idx` with `value`.
    pub fn fill(&mut self, idx: u32, value: RefValue, len: u32) -> Option<()> {
        let start = idx as usize;
        let end = start.checked_add(len as usize)?;
        self.elements.get_mut(start..end)?.fill(value);
        Some(())
    }

    /// Copy `len` slots from `src` to `dst` (may overlap).
    pub fn copy_within(&mut self, dst: u32, src: u32, len: u32) -> Option<()> {
        let src_u = src as usize;
        let dst_u = dst as usize;
        let len_u = len as usize;
        if src_u.checked_add(len_u)? > self.elements.len()
            || dst_u.checked_add(len_u)? > self.elements.len()
        {
            return None;
        }
        self.elements.copy_within(src_u..src_u + len_u, dst_u);
        Some(())
    }
}

/// A mutable or immutable global variable instance.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct GlobalInstance {
    /// Current value.
    pub value: Value,
    /// Whether `global.set` is permitted.
    pub mutable: bool,
}
