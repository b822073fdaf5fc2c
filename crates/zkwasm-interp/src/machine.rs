//! The stack machine: value stack, call frames, linear memory, tables and
//! globals, and the opcode dispatch loop tying them together.
//!
//! Grounded on `interpreter_impl.hpp`'s execution loop, collapsed here into
//! one self-contained struct rather than split across a host/guest trait
//! boundary: every resource a running function can touch (memory, tables,
//! globals, the host call table) lives directly on [`Machine`], since the
//! three prover stages and the verifier (spec component E) all drive the
//! exact same execution surface and gain nothing from an extra abstraction
//! layer here.

use zkwasm_core::{
    ExecResult, LinearMemory, OpKind, Opcode, RefValue, SignKind, TableInstance, TrapReason,
    Value, ValueKind,
};
use zkwasm_field::Scalar;
use zkwasm_witness::{WitnessId, WitnessManager};

use crate::control::Label;
use crate::host::{HostTable, ScalarHeap};
use crate::module::Module;
use crate::numeric;
use crate::value::TracedValue;

struct Frame {
    func_idx: u32,
    pc: usize,
    locals: Vec<TracedValue>,
    labels: Vec<Label>,
}

/// A running instance of a [`Module`]: value stack, call frames, linear
/// memory, tables, globals, and the witness pool every traced value is
/// backed by.
pub struct Machine<'m> {
    module: &'m Module,
    pub mgr: WitnessManager,
    pub scalars: ScalarHeap,
    host: HostTable,
    stack: Vec<TracedValue>,
    frames: Vec<Frame>,
    memory: LinearMemory,
    tables: Vec<TableInstance>,
    globals: Vec<TracedValue>,
    global_mutable: Vec<bool>,
    data: Vec<crate::module::DataSegment>,
    elems: Vec<crate::module::ElemSegment>,
}

/// The recursion budget protecting against runaway call chains in a
/// malformed module (there is no native call stack to overflow onto, since
/// frames live in a `Vec`, but an unbounded chain would otherwise run
/// forever).
const MAX_CALL_DEPTH: usize = 1024;

impl<'m> Machine<'m> {
    /// Build a fresh instance of `module`, running its globals' initializers
    /// and element/data segments exactly once (module instantiation).
    #[must_use]
    pub fn new(module: &'m Module, mgr: WitnessManager, host: HostTable) -> Self {
        let mut m = Self {
            module,
            mgr,
            scalars: ScalarHeap::new(),
            host,
            stack: Vec::new(),
            frames: Vec::new(),
            memory: LinearMemory::new(module.memory_limits.min, module.memory_limits.max),
            tables: module.initial_tables(),
            globals: Vec::new(),
            global_mutable: Vec::new(),
            data: module.data_segments.clone(),
            elems: module.elem_segments.clone(),
        };
        for g in &module.globals_init {
            let traced = m.acquire_public(g.value.kind(), g.value.as_u64());
            m.globals.push(traced);
            m.global_mutable.push(g.mutable);
        }
        m
    }

    /// Run the module's `start` function, if it declares one.
    pub fn run_start(&mut self) -> Result<(), TrapReason> {
        if let Some(idx) = self.module.start {
            self.call(idx, Vec::new())?;
        }
        Ok(())
    }

    /// Call function `idx` with `args` already on hand (not the stack),
    /// returning its results. Used both for the module's exported entry
    /// point and for `call`/`call_indirect` internally.
    ///
    /// `idx` may name either an ordinary function or a host import: imports
    /// still occupy an entry in [`Module::funcs`] (with an empty `code`),
    /// solely so their signature is available here — the host table
    /// intercepts before that body would ever run.
    pub fn call(&mut self, idx: u32, args: Vec<TracedValue>) -> Result<Vec<TracedValue>, TrapReason> {
        let func_ty = self.module.types[self.module.funcs[idx as usize].type_index as usize].clone();
        if let Some(host_fn) = self.host.get(idx.into()) {
            for a in args {
                self.stack.push(a);
            }
            host_fn(self)?;
            let mut results = Vec::with_capacity(func_ty.results.len());
            for _ in &func_ty.results {
                results.push(self.stack.pop().expect("host call left too few results"));
            }
            results.reverse();
            return Ok(results);
        }

        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(TrapReason::TypeMismatch);
        }

        let func = &self.module.funcs[idx as usize];
        let func_ty = &self.module.types[func.type_index as usize];
        let mut locals = args;
        for kind in &func.locals {
            locals.push(self.acquire_public(*kind, 0));
        }
        let top_label = Label {
            arity: func_ty.results.len() as u32,
            stack_base: self.stack.len(),
            branch_target: func.code.len(),
            is_loop: false,
        };
        self.frames.push(Frame {
            func_idx: idx,
            pc: 0,
            locals,
            labels: vec![top_label],
        });

        let stack_base = self.stack.len();
        let outcome = self.run_frame();
        let frame = self.frames.pop().expect("frame pushed above");
        for local in frame.locals {
            self.mgr.release(local.witness);
        }

        match outcome {
            Err(trap) => Err(trap),
            Ok(ExecResult::Trap(trap)) => Err(trap),
            Ok(_) => {
                let results = self.stack.split_off(stack_base);
                debug_assert_eq!(results.len(), func_ty.results.len());
                Ok(results)
            }
        }
    }

    /// Execute opcodes from the current frame's `pc` until it returns, traps,
    /// or falls off the end of its body.
    fn run_frame(&mut self) -> Result<ExecResult, TrapReason> {
        loop {
            let frame_idx = self.frames.len() - 1;
            let func_idx = self.frames[frame_idx].func_idx;
            let pc = self.frames[frame_idx].pc;
            let code = &self.module.funcs[func_idx as usize].code;
            if pc >= code.len() {
                return Ok(ExecResult::Ok);
            }
            let op = code[pc];
            self.frames[frame_idx].pc += 1;
            tracing::trace!(?func_idx, pc, kind = ?op.kind, "step");

            match self.step(op)? {
                ExecResult::Ok => {}
                ExecResult::Branch(depth) => {
                    if self.unwind_branch(depth)? {
                        return Ok(ExecResult::Ok);
                    }
                }
                ExecResult::Trap(t) => {
                    tracing::warn!(?func_idx, pc, reason = %t, "trap");
                    return Ok(ExecResult::Trap(t));
                }
            }
        }
    }

    /// Resolve a branch `depth` levels up the active label stack: truncate
    /// the value stack to the label's base, re-push its live results, and
    /// either jump to the loop's start (loop label) or past the matching
    /// `end`/out of the function entirely (block/if/outermost label).
    /// Returns `true` if the branch exited the current function (a `return`
    /// or a branch past the outermost label).
    fn unwind_branch(&mut self, depth: u32) -> Result<bool, TrapReason> {
        let frame = self.frames.last_mut().expect("active frame");
        let target_idx = frame.labels.len() - 1 - depth as usize;
        let label = frame.labels[target_idx];
        let results = self.stack.split_off(self.stack.len() - label.arity as usize);
        while self.stack.len() > label.stack_base {
            let extra = self.stack.pop().expect("stack.len() > stack_base implies non-empty");
            self.mgr.release(extra.witness);
        }
        for r in results {
            self.stack.push(r);
        }

        if target_idx == 0 && !label.is_loop {
            frame.labels.truncate(1);
            frame.pc = frame.labels[0].branch_target;
            return Ok(true);
        }

        frame.labels.truncate(target_idx + usize::from(label.is_loop));
        frame.pc = label.branch_target;
        Ok(false)
    }

    /// Execute one opcode, returning how control should proceed.
    fn step(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        use OpKind::*;
        match op.kind {
            Unreachable => return Ok(ExecResult::Trap(TrapReason::Unreachable)),
            Nop => {}
            Drop => {
                let v = self.pop_value();
                self.mgr.release(v.witness);
            }
            Select => self.exec_select(),
            InnConst => self.exec_const(op),

            InnClz | InnCtz | InnPopcnt | Extend8S | Extend16S | I64Extend32S | I64ExtendI32
            | I32WrapI64 | InnEqz => self.exec_unary(op),

            InnAdd | InnSub | InnMul | InnDivSx | InnRemSx | InnAnd | InnOr | InnXor | InnShl
            | InnShrSx | InnRotl | InnRotr | InnEq | InnNe | InnLtSx | InnGtSx | InnLeSx
            | InnGeSx => return self.exec_binary(op),

            LocalGet => self.exec_local_get(op.a),
            LocalSet => self.exec_local_set(op.a),
            LocalTee => self.exec_local_tee(op.a),
            GlobalGet => self.exec_global_get(op.a),
            GlobalSet => self.exec_global_set(op.a)?,

            Block | Loop => self.exec_block(op),
            If => return self.exec_if(op),
            Else => self.exec_else(op),
            End => self.exec_end(),
            Br => return Ok(ExecResult::Branch(op.d)),
            BrIf => return self.exec_br_if(op),
            BrTable => return self.exec_br_table(op),
            Return => {
                let depth = self.frames.last().expect("active frame").labels.len() as u32 - 1;
                return Ok(ExecResult::Branch(depth));
            }
            Call => return self.exec_call(op),
            CallIndirect => return self.exec_call_indirect(op),

            TableGet => self.exec_table_get(op)?,
            TableSet => self.exec_table_set(op)?,
            TableSize => self.exec_table_size(op),
            TableGrow => self.exec_table_grow(op),
            TableFill => self.exec_table_fill(op)?,
            TableCopy => self.exec_table_copy(op)?,
            TableInit => self.exec_table_init(op)?,
            ElemDrop => self.elems[op.a as usize].dropped = true,

            Load => return self.exec_load(op),
            Store => return self.exec_store(op),
            MemorySize => self.exec_memory_size(),
            MemoryGrow => self.exec_memory_grow(),
            MemoryFill => return self.exec_memory_fill(op),
            MemoryCopy => return self.exec_memory_copy(op),
            MemoryInit => return self.exec_memory_init(op),
            DataDrop => self.data[op.a as usize].dropped = true,

            RefNull => self.exec_ref_null(op),
            RefIsNull => self.exec_ref_is_null(),
            RefFunc => self.exec_ref_func(op),
        }
        Ok(ExecResult::Ok)
    }

    // --- stack / misc ---------------------------------------------------

    fn exec_const(&mut self, op: Opcode) {
        let (kind, imm) = op.decode_const();
        let traced = self.acquire_public(kind, imm as u64);
        self.stack.push(traced);
    }

    /// `select`: condition is "nonzero", not strictly boolean, so it's run
    /// through [`numeric::eqz`] first and multiplexed as `val2 + (1-isz)*(val1-val2)`.
    fn exec_select(&mut self) {
        use zkwasm_algebra::{eval, Expr};
        let cond = self.pop_value();
        let val2 = self.pop_value();
        let val1 = self.pop_value();
        let is_zero = numeric::eqz(&mut self.mgr, cond.value.kind(), cond);
        let is_nonzero = eval(
            &mut self.mgr,
            &Expr::sub(Expr::constant(Scalar::one()), Expr::witness(is_zero.witness)),
        );
        self.mgr.release(is_zero.witness);
        let diff = eval(
            &mut self.mgr,
            &Expr::sub(Expr::witness(val1.witness), Expr::witness(val2.witness)),
        );
        self.mgr.release(val1.witness);
        let picked = eval(&mut self.mgr, &Expr::mul(Expr::witness(is_nonzero), Expr::witness(diff)));
        self.mgr.release(is_nonzero);
        self.mgr.release(diff);
        let result = eval(&mut self.mgr, &Expr::add(Expr::witness(val2.witness), Expr::witness(picked)));
        self.mgr.release(val2.witness);
        self.mgr.release(picked);
        let concrete = if cond.value.as_u64() != 0 { val1.value } else { val2.value };
        self.stack.push(TracedValue::new(concrete, result));
    }

    // --- numeric ---------------------------------------------------------

    fn exec_unary(&mut self, op: Opcode) {
        let (kind, _sign, _, _) = op.decode_numeric();
        let a = self.pop_value();
        let result = match op.kind {
            OpKind::InnClz => numeric::clz(&mut self.mgr, kind, a),
            OpKind::InnCtz => numeric::ctz(&mut self.mgr, kind, a),
            OpKind::InnPopcnt => numeric::popcnt(&mut self.mgr, kind, a),
            OpKind::Extend8S => numeric::extend8_s(&mut self.mgr, kind, a),
            OpKind::Extend16S => numeric::extend16_s(&mut self.mgr, kind, a),
            OpKind::I64Extend32S => numeric::extend32_s(&mut self.mgr, a),
            OpKind::I64ExtendI32 => numeric::extend_i32(&mut self.mgr, _sign, a),
            OpKind::I32WrapI64 => numeric::wrap_i64(&mut self.mgr, a),
            OpKind::InnEqz => numeric::eqz(&mut self.mgr, kind, a),
            _ => unreachable!("exec_unary dispatched a non-unary opcode"),
        };
        self.stack.push(result);
    }

    fn exec_binary(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let (kind, sign, _, _) = op.decode_numeric();
        let b = self.pop_value();
        let a = self.pop_value();
        let result = match op.kind {
            OpKind::InnAdd => numeric::add(&mut self.mgr, kind, a, b),
            OpKind::InnSub => numeric::sub(&mut self.mgr, kind, a, b),
            OpKind::InnMul => numeric::mul(&mut self.mgr, kind, a, b),
            OpKind::InnDivSx if sign == SignKind::Signed => {
                let (q, _r) = numeric::div_rem_s(&mut self.mgr, kind, a, b)?;
                self.mgr.release(_r.witness);
                q
            }
            OpKind::InnDivSx => {
                let (q, _r) = numeric::div_rem_u(&mut self.mgr, kind, a, b)?;
                self.mgr.release(_r.witness);
                q
            }
            OpKind::InnRemSx if sign == SignKind::Signed => {
                let (_q, r) = numeric::div_rem_s(&mut self.mgr, kind, a, b)?;
                self.mgr.release(_q.witness);
                r
            }
            OpKind::InnRemSx => {
                let (_q, r) = numeric::div_rem_u(&mut self.mgr, kind, a, b)?;
                self.mgr.release(_q.witness);
                r
            }
            OpKind::InnAnd => numeric::bitand(&mut self.mgr, kind, a, b),
            OpKind::InnOr => numeric::bitor(&mut self.mgr, kind, a, b),
            OpKind::InnXor => numeric::bitxor(&mut self.mgr, kind, a, b),
            OpKind::InnShl => numeric::shl(&mut self.mgr, kind, a, b),
            OpKind::InnShrSx if sign == SignKind::Signed => numeric::shr_s(&mut self.mgr, kind, a, b),
            OpKind::InnShrSx => numeric::shr_u(&mut self.mgr, kind, a, b),
            OpKind::InnRotl => numeric::rotl(&mut self.mgr, kind, a, b),
            OpKind::InnRotr => numeric::rotr(&mut self.mgr, kind, a, b),
            OpKind::InnEq => numeric::eq(&mut self.mgr, kind, a, b),
            OpKind::InnNe => numeric::ne(&mut self.mgr, kind, a, b),
            OpKind::InnLtSx => numeric::lt(&mut self.mgr, kind, sign, a, b),
            OpKind::InnGtSx => numeric::gt(&mut self.mgr, kind, sign, a, b),
            OpKind::InnLeSx => numeric::le(&mut self.mgr, kind, sign, a, b),
            OpKind::InnGeSx => numeric::ge(&mut self.mgr, kind, sign, a, b),
            _ => unreachable!("exec_binary dispatched a non-binary opcode"),
        };
        self.stack.push(result);
        Ok(ExecResult::Ok)
    }

    // --- variables ---------------------------------------------------------

    fn exec_local_get(&mut self, idx: u32) {
        let frame = self.frames.last().expect("active frame");
        let v = frame.locals[idx as usize];
        self.mgr.retain(v.witness);
        self.stack.push(v);
    }

    fn exec_local_set(&mut self, idx: u32) {
        let v = self.pop_value();
        let frame = self.frames.last_mut().expect("active frame");
        let old = std::mem::replace(&mut frame.locals[idx as usize], v);
        self.mgr.release(old.witness);
    }

    fn exec_local_tee(&mut self, idx: u32) {
        let v = self.pop_value();
        self.mgr.retain(v.witness);
        self.stack.push(v);
        let frame = self.frames.last_mut().expect("active frame");
        let old = std::mem::replace(&mut frame.locals[idx as usize], v);
        self.mgr.release(old.witness);
    }

    fn exec_global_get(&mut self, idx: u32) {
        let v = self.globals[idx as usize];
        self.mgr.retain(v.witness);
        self.stack.push(v);
    }

    fn exec_global_set(&mut self, idx: u32) -> Result<(), TrapReason> {
        if !self.global_mutable[idx as usize] {
            return Err(TrapReason::TypeMismatch);
        }
        let v = self.pop_value();
        let old = std::mem::replace(&mut self.globals[idx as usize], v);
        self.mgr.release(old.witness);
        Ok(())
    }

    // --- control flow --------------------------------------------------

    fn exec_block(&mut self, op: Opcode) {
        let frame = self.frames.last_mut().expect("active frame");
        let is_loop = op.kind == OpKind::Loop;
        // `frame.pc` was already advanced past this opcode, so it already
        // points at the loop's own body start.
        let body_start = frame.pc;
        frame.labels.push(Label {
            arity: op.c,
            stack_base: self.stack.len(),
            branch_target: if is_loop { body_start } else { op.d as usize + 1 },
            is_loop,
        });
    }

    fn exec_if(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let cond = self.pop_value();
        self.mgr.release(cond.witness);
        let taken = cond.value.as_u64() != 0;
        let frame = self.frames.last_mut().expect("active frame");
        frame.labels.push(Label {
            arity: op.c,
            stack_base: self.stack.len(),
            branch_target: op.a as usize + 1,
            is_loop: false,
        });
        if !taken {
            frame.pc = op.d as usize;
        }
        Ok(ExecResult::Ok)
    }

    fn exec_else(&mut self, op: Opcode) {
        // Reached only by falling through the taken `if`-branch: skip the
        // `else`-branch entirely by jumping to the matching `end`.
        let frame = self.frames.last_mut().expect("active frame");
        frame.pc = op.d as usize;
    }

    fn exec_end(&mut self) {
        let frame = self.frames.last_mut().expect("active frame");
        if frame.labels.len() > 1 {
            frame.labels.pop();
        }
    }

    fn exec_br_if(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let cond = self.pop_value();
        let taken = cond.value.as_u64() != 0;
        self.mgr.release(cond.witness);
        if taken {
            Ok(ExecResult::Branch(op.d))
        } else {
            Ok(ExecResult::Ok)
        }
    }

    fn exec_br_table(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let idx_val = self.pop_value();
        let idx = idx_val.value.as_u64() as usize;
        self.mgr.release(idx_val.witness);
        let func_idx = self.frames.last().expect("active frame").func_idx;
        let targets = &self.module.funcs[func_idx as usize].br_tables[op.c as usize];
        let depth = targets.get(idx).copied().unwrap_or_else(|| *targets.last().expect("br_table has a default"));
        Ok(ExecResult::Branch(depth))
    }

    fn exec_call(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let func = &self.module.funcs[op.a as usize];
        let params_len = self.module.types[func.type_index as usize].params.len();
        let args = self.stack.split_off(self.stack.len() - params_len);
        match self.call(op.a, args) {
            Ok(results) => {
                for r in results {
                    self.stack.push(r);
                }
                Ok(ExecResult::Ok)
            }
            Err(t) => Ok(ExecResult::Trap(t)),
        }
    }

    fn exec_call_indirect(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let elem = self.pop_value();
        self.mgr.release(elem.witness);
        let table_idx = op.b as usize;
        let type_idx = op.a as usize;
        let slot = match self.tables[table_idx].get(elem.value.as_u64() as u32) {
            Some(RefValue::FuncRef(Some(f))) => f,
            _ => return Ok(ExecResult::Trap(TrapReason::UninitializedElement)),
        };
        let func = &self.module.funcs[slot.index()];
        if func.type_index as usize != type_idx {
            return Ok(ExecResult::Trap(TrapReason::TypeMismatch));
        }
        let params_len = self.module.types[type_idx].params.len();
        let args = self.stack.split_off(self.stack.len() - params_len);
        match self.call(slot.0, args) {
            Ok(results) => {
                for r in results {
                    self.stack.push(r);
                }
                Ok(ExecResult::Ok)
            }
            Err(t) => Ok(ExecResult::Trap(t)),
        }
    }

    // --- table -----------------------------------------------------------

    fn exec_table_get(&mut self, op: Opcode) -> Result<(), TrapReason> {
        let idx = self.pop_value();
        self.mgr.release(idx.witness);
        let r = self.tables[op.a as usize]
            .get(idx.value.as_u64() as u32)
            .ok_or(TrapReason::TableOutOfBounds)?;
        self.stack.push(self.acquire_public(ValueKind::I32, ref_to_u64(r)));
        Ok(())
    }

    fn exec_table_set(&mut self, op: Opcode) -> Result<(), TrapReason> {
        let value = self.pop_value();
        let idx = self.pop_value();
        let r = u64_to_ref(op.b, value.value.as_u64());
        self.mgr.release(value.witness);
        self.mgr.release(idx.witness);
        self.tables[op.a as usize]
            .set(idx.value.as_u64() as u32, r)
            .ok_or(TrapReason::TableOutOfBounds)
    }

    fn exec_table_size(&mut self, op: Opcode) {
        let size = self.tables[op.a as usize].size();
        self.stack.push(self.acquire_public(ValueKind::I32, u64::from(size)));
    }

    fn exec_table_grow(&mut self, op: Opcode) {
        let delta = self.pop_value();
        let fill = self.pop_value();
        let r = u64_to_ref(op.b, fill.value.as_u64());
        self.mgr.release(delta.witness);
        self.mgr.release(fill.witness);
        let prev = self.tables[op.a as usize]
            .grow(delta.value.as_u64() as u32, r)
            .map_or(-1i64, i64::from);
        self.stack.push(self.acquire_public(ValueKind::I32, prev as u64));
    }

    fn exec_table_fill(&mut self, op: Opcode) -> Result<(), TrapReason> {
        let len = self.pop_value();
        let value = self.pop_value();
        let idx = self.pop_value();
        let r = u64_to_ref(op.b, value.value.as_u64());
        let (idx_v, len_v) = (idx.value.as_u64() as u32, len.value.as_u64() as u32);
        self.mgr.release(len.witness);
        self.mgr.release(value.witness);
        self.mgr.release(idx.witness);
        self.tables[op.a as usize].fill(idx_v, r, len_v).ok_or(TrapReason::TableOutOfBounds)
    }

    fn exec_table_copy(&mut self, op: Opcode) -> Result<(), TrapReason> {
        let len = self.pop_value();
        let src = self.pop_value();
        let dst = self.pop_value();
        let (dst_v, src_v, len_v) = (dst.value.as_u64() as u32, src.value.as_u64() as u32, len.value.as_u64() as u32);
        self.mgr.release(len.witness);
        self.mgr.release(src.witness);
        self.mgr.release(dst.witness);
        if op.a == op.b {
            self.tables[op.a as usize].copy_within(dst_v, src_v, len_v).ok_or(TrapReason::TableOutOfBounds)
        } else {
            for i in 0..len_v {
                let v = self.tables[op.b as usize].get(src_v + i).ok_or(TrapReason::TableOutOfBounds)?;
                self.tables[op.a as usize].set(dst_v + i, v).ok_or(TrapReason::TableOutOfBounds)?;
            }
            Ok(())
        }
    }

    fn exec_table_init(&mut self, op: Opcode) -> Result<(), TrapReason> {
        let len = self.pop_value();
        let src = self.pop_value();
        let dst = self.pop_value();
        let (dst_v, src_v, len_v) = (dst.value.as_u64() as u32, src.value.as_u64() as u32, len.value.as_u64() as usize);
        self.mgr.release(len.witness);
        self.mgr.release(src.witness);
        self.mgr.release(dst.witness);
        let elem = &self.elems[op.c as usize];
        if elem.dropped {
            return Err(TrapReason::TableOutOfBounds);
        }
        let items = elem.items.get(src_v as usize..src_v as usize + len_v).ok_or(TrapReason::TableOutOfBounds)?.to_vec();
        for (i, r) in items.into_iter().enumerate() {
            self.tables[op.a as usize].set(dst_v + i as u32, r).ok_or(TrapReason::TableOutOfBounds)?;
        }
        Ok(())
    }

    // --- memory ------------------------------------------------------------

    fn exec_load(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let (kind, sign, _align, offset) = op.decode_numeric();
        let addr = self.pop_value();
        let base = addr.value.as_u64();
        self.mgr.release(addr.witness);
        let eff = base.wrapping_add(u64::from(offset));
        let width = kind.bits() / 8;
        let bytes = self
            .memory
            .read(eff, width as u64)
            .ok_or(TrapReason::MemoryOutOfBounds)?
            .to_vec();
        let secret = self.memory.is_secret(eff, width as u64);
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(&bytes);
        let raw = u64::from_le_bytes(buf);
        let value = match (kind, sign) {
            (ValueKind::I32, _) => Value::I32(raw as u32 as i32),
            (ValueKind::I64, _) => Value::I64(raw as i64),
        };
        let traced = if secret {
            let w = self.mgr.acquire_witness(Scalar::from_u64(raw));
            TracedValue::new(value, w)
        } else {
            self.acquire_public(kind, raw)
        };
        self.stack.push(traced);
        Ok(ExecResult::Ok)
    }

    fn exec_store(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let (kind, _sign, _align, offset) = op.decode_numeric();
        let value = self.pop_value();
        let addr = self.pop_value();
        let base = addr.value.as_u64();
        self.mgr.release(addr.witness);
        let eff = base.wrapping_add(u64::from(offset));
        let width = kind.bits() / 8;
        let raw = value.value.as_u64();
        self.mgr.release(value.witness);
        let bytes = raw.to_le_bytes();
        self.memory.write(eff, &bytes[..width]).ok_or(TrapReason::MemoryOutOfBounds)?;
        Ok(ExecResult::Ok)
    }

    fn exec_memory_size(&mut self) {
        let pages = self.memory.size_pages();
        self.stack.push(self.acquire_public(ValueKind::I32, u64::from(pages)));
    }

    fn exec_memory_grow(&mut self) {
        let delta = self.pop_value();
        let prev = self.memory.grow(delta.value.as_u64() as u32).map_or(-1i64, i64::from);
        self.mgr.release(delta.witness);
        self.stack.push(self.acquire_public(ValueKind::I32, prev as u64));
    }

    fn exec_memory_fill(&mut self, _op: Opcode) -> Result<ExecResult, TrapReason> {
        let len = self.pop_value();
        let val = self.pop_value();
        let dst = self.pop_value();
        let (dst_v, val_v, len_v) = (dst.value.as_u64(), val.value.as_u64() as u8, len.value.as_u64());
        self.mgr.release(len.witness);
        self.mgr.release(val.witness);
        self.mgr.release(dst.witness);
        self.memory.fill(dst_v, val_v, len_v).ok_or(TrapReason::MemoryOutOfBounds)?;
        Ok(ExecResult::Ok)
    }

    fn exec_memory_copy(&mut self, _op: Opcode) -> Result<ExecResult, TrapReason> {
        let len = self.pop_value();
        let src = self.pop_value();
        let dst = self.pop_value();
        let (dst_v, src_v, len_v) = (dst.value.as_u64(), src.value.as_u64(), len.value.as_u64());
        self.mgr.release(len.witness);
        self.mgr.release(src.witness);
        self.mgr.release(dst.witness);
        self.memory.copy(dst_v, src_v, len_v).ok_or(TrapReason::MemoryOutOfBounds)?;
        Ok(ExecResult::Ok)
    }

    fn exec_memory_init(&mut self, op: Opcode) -> Result<ExecResult, TrapReason> {
        let len = self.pop_value();
        let src = self.pop_value();
        let dst = self.pop_value();
        let (dst_v, src_v, len_v) = (dst.value.as_u64(), src.value.as_u64() as usize, len.value.as_u64() as usize);
        self.mgr.release(len.witness);
        self.mgr.release(src.witness);
        self.mgr.release(dst.witness);
        let seg = &self.data[op.a as usize];
        if seg.dropped {
            return Err(TrapReason::MemoryOutOfBounds);
        }
        let bytes = seg.bytes.get(src_v..src_v + len_v).ok_or(TrapReason::MemoryOutOfBounds)?.to_vec();
        self.memory.write(dst_v, &bytes).ok_or(TrapReason::MemoryOutOfBounds)?;
        Ok(ExecResult::Ok)
    }

    // --- reference ---------------------------------------------------------

    fn exec_ref_null(&mut self, op: Opcode) {
        let r = if op.a == 0 { RefValue::FuncRef(None) } else { RefValue::ExternRef(None) };
        self.stack.push(self.acquire_public(ValueKind::I32, ref_to_u64(r)));
    }

    fn exec_ref_is_null(&mut self) {
        let v = self.pop_value();
        let is_null = v.value.as_u64() == 0;
        self.mgr.release(v.witness);
        self.stack.push(self.acquire_public(ValueKind::I32, u64::from(is_null)));
    }

    fn exec_ref_func(&mut self, op: Opcode) {
        self.stack.push(self.acquire_public(ValueKind::I32, ref_to_u64(RefValue::FuncRef(Some(op.a.into())))));
    }

    // --- helpers -------------------------------------------------------

    pub(crate) fn pop_value(&mut self) -> TracedValue {
        self.stack.pop().expect("value stack underflow: malformed opcode stream")
    }

    pub(crate) fn push_i32(&mut self, v: i32) {
        let traced = self.acquire_public(ValueKind::I32, v as u32 as u64);
        self.stack.push(traced);
    }

    pub(crate) fn release(&mut self, id: WitnessId) {
        self.mgr.release(id);
    }

    /// A fresh witness constrained to the public constant `v`, with no
    /// associated WASM value — used for the host-owned bn254 scalar heap,
    /// whose entries have no `i32`/`i64` representation at all.
    pub(crate) fn acquire_scalar_witness(&mut self, v: Scalar) -> WitnessId {
        let w = self.mgr.acquire_witness(v);
        self.mgr.constrain_constant(w, v);
        w
    }

    pub(crate) fn acquire_public(&mut self, kind: ValueKind, raw: u64) -> TracedValue {
        let value = match kind {
            ValueKind::I32 => Value::I32(raw as u32 as i32),
            ValueKind::I64 => Value::I64(raw as i64),
        };
        let scalar = Scalar::from_u64(raw & mask_for(kind));
        let w = self.mgr.acquire_witness(scalar);
        self.mgr.constrain_constant(w, scalar);
        TracedValue::new(value, w)
    }
}

fn mask_for(kind: ValueKind) -> u64 {
    match kind {
        ValueKind::I32 => u64::from(u32::MAX),
        ValueKind::I64 => u64::MAX,
    }
}

/// Reference values never carry secret data (spec component D's witnessed
/// path covers integer arithmetic only), so tables encode them as a plain
/// public `i32`: `0` for null, `index + 1` otherwise. The table's own
/// declared element type disambiguates func-ref from extern-ref on read.
fn ref_to_u64(r: RefValue) -> u64 {
    match r {
        RefValue::FuncRef(None) | RefValue::ExternRef(None) => 0,
        RefValue::FuncRef(Some(idx)) => u64::from(idx.0) + 1,
        RefValue::ExternRef(Some(idx)) => u64::from(idx) + 1,
    }
}

fn u64_to_ref(elem_kind: u32, raw: u64) -> RefValue {
    if raw == 0 {
        if elem_kind == 0 {
            RefValue::FuncRef(None)
        } else {
            RefValue::ExternRef(None)
        }
    } else if elem_kind == 0 {
        RefValue::FuncRef(Some(((raw - 1) as u32).into()))
    } else {
        RefValue::ExternRef(Some((raw - 1) as u32))
    }
}
