//! Backend abstraction for proving and verification.
//!
//! Implementors provide a *stateless* API (associated functions) over a
//! backend-chosen `Program` representation, producing or checking a
//! backend-chosen `Proof`. Associated types (rather than hardcoding to one
//! concrete program/proof type) keep `zkwasm-core` free of a dependency on
//! the higher-level interpreter/execution crates, which in turn depend on
//! this crate.
//!
//! ## Contracts implementors should uphold
//! - `prove` must bind the proof to the given `manifest_root` (typically the
//!   Stage-1 Merkle root) and encode any necessary opening/consistency data
//!   in the returned `Proof`.
//! - `verify` must reject if the proof's embedded root mismatches
//!   `manifest_root`, or if any transcript check fails.
//! - Neither function should panic for malformed inputs; return `Err`
//!   instead.

use anyhow::Result;

/// Minimal backend API the rest of the system depends on.
pub trait ProvingBackend {
    /// The executable program form this backend consumes (e.g. a decoded
    /// opcode stream plus its host-call table).
    type Program;
    /// The backend's serialized proof representation (e.g. a
    /// [`crate::artifact::ProofArchive`]).
    type Proof;

    /// Produce a proof tied to `manifest_root` for the given program.
    ///
    /// # Errors
    /// Returns an error if the backend cannot construct a proof (e.g. a
    /// trapped execution, inconsistent parameters, internal constraint
    /// failure).
    fn prove(program: &Self::Program, manifest_root: [u8; 32]) -> Result<Self::Proof>;

    /// Verify a previously generated proof against `manifest_root`.
    ///
    /// # Errors
    /// Returns an error if the proof is invalid for the provided inputs or
    /// any internal check fails (e.g. root mismatch, malformed encoding).
    fn verify(proof: &Self::Proof, manifest_root: [u8; 32]) -> Result<()>;
}
