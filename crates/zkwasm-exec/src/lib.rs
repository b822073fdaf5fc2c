//! Execution contexts (spec component E): three full re-executions of the
//! same program — Stage 1 (Merkle-commit), Stage 2 (reduce-and-sum), Stage 3
//! (sample) — plus a verifier, all sharing one master RNG seed so the
//! sequence of transcript rows each stage emits is byte-identical (spec §3's
//! row-ordering invariant).
//!
//! [`runner`] hosts the one interpreter-driving loop all three prover
//! stages reuse; they differ only in which [`zkwasm_witness::WitnessManager`]
//! callbacks they install (spec §4.E). [`column`] is the shared per-column
//! SHA-256 accumulator Stage 1 and Stage 3 both build a Merkle tree from.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod args;
pub mod column;
pub mod config;
pub mod prover;
pub mod runner;
pub mod sample;
pub mod stage1;
pub mod stage2;
pub mod stage3;
pub mod verifier;

pub use args::ProgramArgs;
pub use config::ExecConfig;
pub use prover::{prove, verify, ZkWasmBackend, ZkWasmProgram, ZkWasmProverError};
pub use runner::execute;
