//! Control-flow label bookkeeping for [`crate::machine::Machine`].
//!
//! The opcode stream is flat (no nested AST), so `block`/`loop`/`if` carry
//! their own jump target directly in the fixed-width [`zkwasm_core::Opcode`]
//! record rather than relying on tree structure:
//!
//! - `Block`/`Loop`: `c` = result arity, `d` = pc of the matching `End`.
//! - `If`: `c` = result arity, `a` = pc of the matching `End`, `d` = the pc
//!   to jump to if the condition is false — the matching `Else`'s body
//!   start, or the matching `End` itself if there is no `Else`.
//! - `Else`: `d` = pc of the matching `End` (reached by falling through the
//!   taken `if`-branch and needing to skip the `else`-branch entirely).
//! - `Br`/`BrIf`: `d` = the branch depth (0 = innermost enclosing label).
//!
//! A label's `branch_target` (where an outward branch resumes) is always
//! one past the matching `End`'s pc for a block/if label — branching out
//! skips the `End` marker too, since `End` is only ever reached by falling
//! through and its only job there is to pop the label that a branch has
//! already popped for it.
//! - `BrTable`: `c` indexes [`crate::module::Function::br_tables`], whose
//!   last entry is the default target and the rest the indexed targets.
//!
//! Grounded on `interpreter_impl.hpp`'s label-stack handling of WASM's
//! structured control flow, adapted to a flat pc-addressed stream.

/// One entry of the active label stack, pushed by `block`/`loop`/`if` and
/// popped on a matching `end` or a branch that targets it or an outer label.
#[derive(Copy, Clone, Debug)]
pub struct Label {
    /// Number of result values the construct produces.
    pub arity: u32,
    /// Value-stack height at the point this label was pushed (branching to
    /// this label truncates the stack back to this height, then re-pushes
    /// the top `arity` values).
    pub stack_base: usize,
    /// Where execution resumes on a branch that targets this label: the
    /// loop's own start pc for a loop label, or the pc just past the
    /// matching `End` for a block/if label.
    pub branch_target: usize,
    /// Loop labels stay on the stack after being branched to (a backward
    /// branch re-enters the same construct); block/if labels are popped.
    pub is_loop: bool,
}
