//! Static, already-validated module data the machine executes against.
//!
//! The opcode stream itself is flat (spec component D's input), but
//! `br_table`'s variable-length target list doesn't fit the fixed four-slot
//! [`Opcode`] record, so each function carries a small side table of target
//! vectors and a `br_table` opcode's `c` operand indexes into it.

use serde::{Deserialize, Serialize};
use zkwasm_core::{FuncType, GlobalInstance, Limits, Opcode, RefValue, TableInstance};

const NULL_FUNCREF: RefValue = RefValue::FuncRef(None);

/// One function body: its locals (beyond the declared parameters, which the
/// caller supplies) and its flat instruction stream.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Function {
    pub type_index: u32,
    pub locals: Vec<zkwasm_core::ValueKind>,
    pub code: Vec<Opcode>,
    pub br_tables: Vec<Vec<u32>>,
}

/// A data segment (for `memory.init`), or `None` once dropped by `data.drop`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DataSegment {
    pub bytes: Vec<u8>,
    pub dropped: bool,
}

/// An element segment (for `table.init`), or `None` once dropped.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElemSegment {
    pub items: Vec<RefValue>,
    pub dropped: bool,
}

/// A fully linked module ready to execute: no imports, all indices already
/// resolved to local entries (linking is out of scope per the spec).
///
/// This is the unit the CLI's `program` config key names — the binary/text
/// `.wasm`/`.wat` decoder that would produce one is a named collaborator
/// (spec §1), so the loader reads an already-decoded module straight off
/// disk as JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Module {
    pub types: Vec<FuncType>,
    pub funcs: Vec<Function>,
    pub table_limits: Vec<Limits>,
    pub memory_limits: Limits,
    pub globals_init: Vec<GlobalInstance>,
    pub data_segments: Vec<DataSegment>,
    pub elem_segments: Vec<ElemSegment>,
    pub start: Option<u32>,
}

impl Module {
    #[must_use]
    pub fn initial_tables(&self) -> Vec<TableInstance> {
        self.table_limits
            .iter()
            .map(|limits| TableInstance::new(*limits, NULL_FUNCREF))
            .collect()
    }
}
