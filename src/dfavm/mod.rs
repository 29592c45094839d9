//! The linear matcher IR ("dfavm"): a flat op list a code emitter can walk
//! once to produce target-language source, without re-deriving any control
//! flow from the state graph.

pub mod lower;
pub mod op;

pub use lower::{lower, lower_with, LowerOptions};
pub use op::{Cmp, Dest, DfaOp, EndBits, OpKind};
