//! Hand-assembled modules, run end to end, checking the concrete result
//! agrees with what the equivalent native Rust expression would produce.

use zkwasm_core::{FuncType, Limits, OpKind, Opcode, Value, ValueKind};
use zkwasm_field::Scalar;
use zkwasm_interp::{HostTable, Machine, TracedValue};
use zkwasm_witness::WitnessManager;

fn op(kind: OpKind, a: u32, b: u32, c: u32, d: u32) -> Opcode {
    Opcode { kind, a, b, c, d }
}

fn i32_binop_module(kind: OpKind) -> zkwasm_interp::Module {
    zkwasm_interp::Module {
        types: vec![FuncType { params: vec![ValueKind::I32, ValueKind::I32], results: vec![ValueKind::I32] }],
        funcs: vec![zkwasm_interp::module::Function {
            type_index: 0,
            locals: vec![],
            code: vec![
                op(OpKind::LocalGet, 0, 0, 0, 0),
                op(OpKind::LocalGet, 1, 0, 0, 0),
                op(kind, 0, 0, 0, 0),
            ],
            br_tables: vec![],
        }],
        table_limits: vec![],
        memory_limits: Limits { min: 0, max: Some(0) },
        globals_init: vec![],
        data_segments: vec![],
        elem_segments: vec![],
        start: None,
    }
}

fn run_binop(kind: OpKind, lhs: i32, rhs: i32) -> (i32, Scalar) {
    let module = i32_binop_module(kind);
    let mut mgr = WitnessManager::new(4, 4, [1u8; 32]);
    let a = TracedValue::new(Value::I32(lhs), mgr.acquire_witness(Scalar::from_u64(lhs as u32 as u64)));
    let b = TracedValue::new(Value::I32(rhs), mgr.acquire_witness(Scalar::from_u64(rhs as u32 as u64)));

    let mut machine = Machine::new(&module, mgr, HostTable::new());
    machine.run_start().expect("no start fn");
    let results = machine.call(0, vec![a, b]).expect("call should not trap");
    assert_eq!(results.len(), 1);
    let Value::I32(concrete) = results[0].value else { panic!("expected i32 result") };
    let witnessed = machine.mgr.value_of(results[0].witness);
    (concrete, witnessed)
}

#[test]
fn add_agrees_concrete_and_witnessed() {
    let (concrete, witnessed) = run_binop(OpKind::InnAdd, 7, 35);
    assert_eq!(concrete, 42);
    assert_eq!(witnessed, Scalar::from_u64(42));
}

#[test]
fn add_wraps_on_i32_overflow() {
    let (concrete, witnessed) = run_binop(OpKind::InnAdd, i32::MAX, 1);
    assert_eq!(concrete, i32::MIN);
    assert_eq!(witnessed, Scalar::from_u64(i32::MIN as u32 as u64));
}

#[test]
fn sub_agrees_concrete_and_witnessed() {
    let (concrete, witnessed) = run_binop(OpKind::InnSub, 10, 3);
    assert_eq!(concrete, 7);
    assert_eq!(witnessed, Scalar::from_u64(7));
}

#[test]
fn mul_agrees_concrete_and_witnessed() {
    let (concrete, witnessed) = run_binop(OpKind::InnMul, 6, 7);
    assert_eq!(concrete, 42);
    assert_eq!(witnessed, Scalar::from_u64(42));
}
