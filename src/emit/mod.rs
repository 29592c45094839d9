//! Code emitters: render a lowered [`crate::dfavm::DfaOp`] program as source
//! in a target language. One submodule per target, all driven by the same
//! [`EmitOptions`].

pub mod c;
pub mod go;
pub mod options;
pub mod rust_target;

pub use options::{EmitOptions, Io};

/// The supported code-generation targets.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    C,
    Go,
    Rust,
}

/// Renders `ops` in `target`'s syntax, per `opts`.
pub fn emit(target: Target, ops: &[crate::dfavm::DfaOp], opts: &EmitOptions) -> String {
    match target {
        Target::C => c::emit(ops, opts),
        Target::Go => go::emit(ops, opts),
        Target::Rust => rust_target::emit(ops, opts),
    }
}
