//! Ambiguity policy: what to do when an accepting state carries more than
//! one end id, i.e. more than one alternative matched at the same position.
//!
//! Grounded on `enum fsm_ambig` in
//! `original_source/include/fsm/options.h`, renamed from the C's bitflag
//! enum (which lets `AMBIG_SINGLE` be the bitwise OR of `AMBIG_ERROR` and
//! `AMBIG_EARLIEST`) to a plain Rust enum, since this crate never needs the
//! flags combined any other way.

/// How to resolve a state with more than one live end id.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AmbiguityPolicy {
    /// Report every live end id; callers decide what to do with more than
    /// one.
    #[default]
    None,
    /// Treat more than one live end id as a hard error.
    Error,
    /// Report only the smallest end id (the earliest-declared alternative).
    Earliest,
    /// Report every live end id, same as `None`, but callers additionally
    /// assert there was only one -- kept distinct from `None` so that an
    /// emitter can choose different generated code for "always exactly one"
    /// versus "possibly several, caller's problem".
    Single,
    /// Report every live end id without restriction.
    Multiple,
}
