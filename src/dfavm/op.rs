//! The matcher IR: a flat list of operations a code emitter walks once.
//!
//! Grounded directly on `struct dfavm_op_ir` in
//! `original_source/src/libfsm/print/go.c` -- same three op shapes (fetch a
//! byte and branch to an end-of-input label, compare the current byte and
//! branch, stop and report accept or fail), same per-op `index` /
//! `num_incoming` / `example` bookkeeping used by the emitter to decide
//! which ops need a label and what to put in a human-readable comment.

use crate::fsm::{EndId, StateId};

/// A byte comparison, as used by a [`OpKind::Branch`].
///
/// Named after `cmp_operator` in `print/go.c`, which maps each of these to
/// the target language's own comparison operator text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cmp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
    /// Always taken; used for an unconditional jump with no byte test.
    Always,
}

/// What a [`OpKind::Stop`] reports.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EndBits {
    Fail,
    Accept,
}

/// A jump target: either a resolved index into the op list, or (during
/// construction, before [`crate::dfavm::lower::lower`] has finished) a
/// forward reference to another state that hasn't been placed yet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dest {
    Op(usize),
    State(StateId),
}

/// One operation in the flat matcher program.
#[derive(Clone, Debug)]
pub enum OpKind {
    /// Consume one byte from input. If input is exhausted, jump to
    /// `on_empty` instead of falling through to the next op.
    Fetch { on_empty: Dest },
    /// If the current byte satisfies `cmp arg`, jump to `dest`; otherwise
    /// fall through to the next op.
    ///
    /// `range` carries the full `(lo, hi)` span this comparison selects when
    /// it stands for a fused multi-byte range (`None` for a single-byte
    /// match or for the `Lt` guard that skips past one) -- an emitter uses
    /// it to render a range-aware condition or comment instead of the bare
    /// `cmp`/`arg` pair.
    Branch {
        cmp: Cmp,
        arg: u8,
        range: Option<(u8, u8)>,
        dest: Dest,
    },
    /// Stop matching and report `end_bits`. `end_ids` is non-empty only on
    /// `EndBits::Accept` ops, and only when the source state carried ids.
    Stop {
        end_bits: EndBits,
        end_ids: Vec<EndId>,
    },
}

/// One entry in the matcher program, with the bookkeeping an emitter needs
/// to decide whether to print a label and what comment to attach.
#[derive(Clone, Debug)]
pub struct DfaOp {
    /// Position in the flat op list; matches this op's index in the
    /// enclosing `Vec`.
    pub index: usize,
    /// How many other ops branch to this one. An emitter only needs to
    /// print a label for ops with `num_incoming > 0`.
    pub num_incoming: usize,
    /// The shortest sequence of input bytes known to reach this op, kept
    /// only for emitting a human-readable comment (`print_label`'s
    /// `// e.g. "..."`).
    pub example: Option<Vec<u8>>,
    /// The `Fsm` state this op was lowered from, where there is one
    /// (`Branch` guard ops share their state's origin but carry no
    /// independent one of their own beyond it). Used to name labels when
    /// `EmitOptions::anonymous_states` is off.
    pub origin_state: Option<StateId>,
    pub kind: OpKind,
}
