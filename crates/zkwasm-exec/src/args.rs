//! Turning a program's public/private argument list into traced values
//! against a freshly-constructed [`WitnessManager`] (spec §6's `args` /
//! `private-indices` config keys).
//!
//! Each of the three prover stages builds its own `WitnessManager`, so this
//! has to run once per stage rather than once per proof — acquiring a
//! witness for the same concrete value against two different managers
//! yields unrelated [`WitnessId`]s.

use zkwasm_core::Value;
use zkwasm_field::Scalar;
use zkwasm_interp::TracedValue;
use zkwasm_witness::WitnessManager;

/// Acquire one traced argument. A public argument is additionally
/// constrained equal to its own (verifier-known) value, exactly the way
/// [`zkwasm_interp::machine::Machine`]'s internal `acquire_public` ties a
/// constant into the transcript; a private argument is left as a free
/// witness, known only through whatever constraints the program itself
/// builds around it.
pub fn acquire_arg(mgr: &mut WitnessManager, value: Value, private: bool) -> TracedValue {
    let scalar = Scalar::from_u64(value.as_u64());
    let w = mgr.acquire_witness(scalar);
    if !private {
        mgr.constrain_constant(w, scalar);
    }
    TracedValue::new(value, w)
}

/// Acquire a whole argument list against `mgr`, marking the positions named
/// by `private_indices` as private.
#[must_use]
pub fn acquire_args(mgr: &mut WitnessManager, values: &[Value], private_indices: &[usize]) -> Vec<TracedValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| acquire_arg(mgr, *v, private_indices.contains(&i)))
        .collect()
}

/// The entry function's argument list as plain data, reusable across all
/// three prover stages (each acquires its own witnesses against its own
/// manager — a [`zkwasm_witness::WitnessId`] from one manager is meaningless
/// against another's pool).
#[derive(Clone, Debug, Default)]
pub struct ProgramArgs {
    /// Concrete argument values, in call order.
    pub values: Vec<Value>,
    /// Positions in `values` that are private (free witnesses, not tied to
    /// a known constant).
    pub private_indices: Vec<usize>,
}

impl ProgramArgs {
    /// Acquire this argument list's traced values against `mgr`.
    #[must_use]
    pub fn acquire(&self, mgr: &mut WitnessManager) -> Vec<TracedValue> {
        acquire_args(mgr, &self.values, &self.private_indices)
    }
}
