//! The one interpreter-driving loop every prover stage reuses.
//!
//! Spec §4.E: "All three prover contexts inherit the same interpreter and
//! witness-manager wiring, differing only in their implementation of
//! `linear_callback`, `quadratic_callback`, and `mask_callback`." This
//! module is that shared wiring; `stage1`/`stage2`/`stage3` differ only in
//! which [`WitnessManager`] they hand it.

use zkwasm_core::TrapReason;
use zkwasm_interp::{HostTable, Machine, Module, TracedValue};
use zkwasm_witness::WitnessManager;

/// Run `module`'s `start` function (if any) followed by `entry`, then hand
/// back both the call's results and the witness manager so the caller can
/// `finalize()` it — finalizing happens outside this helper since the state
/// machine (spec §4.E) only enters `Finalizing` after a clean
/// exit/return, never after a trap.
///
/// # Errors
/// Returns the [`TrapReason`] of whichever opcode trapped. Per spec §7 a
/// trap abandons the whole proof attempt — there is no partial result to
/// recover, and the caller must not call `finalize()` on the manager.
pub fn execute(
    module: &Module,
    entry: u32,
    args: Vec<TracedValue>,
    host: HostTable,
    mgr: WitnessManager,
) -> Result<(Vec<TracedValue>, WitnessManager), TrapReason> {
    let mut machine = Machine::new(module, mgr, host);
    machine.run_start()?;
    let results = machine.call(entry, args)?;
    // The entry's return values are the computation's final, public-facing
    // result — release them into the row stream like any other witness so
    // they're actually committed, rather than leaking past `finalize()`.
    for r in &results {
        machine.mgr.release(r.witness);
    }
    Ok((results, machine.mgr))
}
