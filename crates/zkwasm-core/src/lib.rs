// crates/zkwasm-core/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod artifact;
pub mod backend;
pub mod memory;
pub mod opcode;
pub mod trap;
pub mod types;

pub use artifact::{ProofArchive, SampledColumn};
pub use backend::ProvingBackend;
pub use memory::{ByteRange, LinearMemory, SecretIntervalSet, PAGE_SIZE};
pub use opcode::{OpKind, Opcode, SignKind, ValueKind};
pub use trap::{ExecResult, TrapReason};
pub use types::{
    DataIdx, ElemIdx, FuncIdx, FuncType, GlobalIdx, GlobalInstance, LabelIdx, Limits, LocalIdx,
    MemIdx, RefValue, TableIdx, TableInstance, TypeIdx, Value,
};
