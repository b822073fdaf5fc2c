//! A stack value paired with its witness: every WASM value the interpreter
//! manipulates is simultaneously a concrete `i32`/`i64` (driving control flow
//! and host interaction exactly as ordinary execution would) and a witness
//! in the arithmetic-circuit transcript (driving the constraints a verifier
//! checks later). Keeping both in lockstep on one struct is what lets the
//! rest of the interpreter read like an ordinary WASM interpreter instead of
//! two interleaved ones.

use zkwasm_core::Value;
use zkwasm_field::Scalar;
use zkwasm_witness::WitnessId;

/// One value-stack (or local) slot: a concrete WASM value plus its witness.
#[derive(Copy, Clone, Debug)]
pub struct TracedValue {
    pub value: Value,
    pub witness: WitnessId,
}

impl TracedValue {
    #[must_use]
    pub fn new(value: Value, witness: WitnessId) -> Self {
        Self { value, witness }
    }

    /// The concrete value's canonical-nonnegative field representative
    /// (i.e. `i64` values are mapped through their `u64` bit pattern, never
    /// through a negative `Scalar`) — this is what every witness in this
    /// crate actually holds, so bit decomposition sees the same bits as the
    /// WASM two's-complement representation.
    #[must_use]
    pub fn field_repr(self) -> Scalar {
        match self.value {
            Value::I32(x) => Scalar::from_u64(u64::from(x as u32)),
            Value::I64(x) => Scalar::from_u64(x as u64),
        }
    }
}
