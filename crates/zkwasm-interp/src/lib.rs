//! Stack-machine interpreter over a flat decoded opcode stream: every WASM
//! integer instruction executes twice in lockstep, once as ordinary concrete
//! arithmetic and once as the constraints that tie its result into the
//! arithmetic-circuit transcript a Ligero IOP will later check (spec
//! component D).
//!
//! - [`value::TracedValue`]: one stack/local slot, concrete value plus
//!   witness.
//! - [`numeric`]: the witnessed implementation of every numeric opcode.
//! - [`module`]: the static, already-linked module data a [`machine::Machine`]
//!   executes against.
//! - [`control`]: label-stack bookkeeping for the flat opcode stream's
//!   block/loop/if/branch encoding.
//! - [`host`]: the `bn254fr` host-call ABI and the scalar heap backing it.
//! - [`machine`]: the `Machine` itself — value stack, call frames, linear
//!   memory, tables, globals, and the opcode dispatch loop.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod control;
pub mod host;
pub mod machine;
pub mod module;
pub mod numeric;
pub mod value;

pub use host::{HostFn, HostTable};
pub use machine::Machine;
pub use module::Module;
pub use value::TracedValue;
