//! The error taxonomy for the whole crate.
//!
//! Every fallible operation in this crate returns one of these variants; there
//! is deliberately no "catch-all" variant, so that callers can match
//! exhaustively on the reasons an FSM operation can fail. Violated structural
//! invariants (an edge to a state from another automaton, an epsilon edge
//! surviving past determinisation) are programmer bugs, not values of this
//! type -- they panic instead.

use thiserror::Error;

/// The error type returned by fallible operations in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// A transformation would have produced more states than the caller's
    /// budget allowed. The automaton that triggered this is not returned;
    /// the caller's original automaton (if any) is untouched.
    #[error("transformation exceeded the state budget of {max_states} states")]
    TooManyStates {
        /// The budget that was exceeded.
        max_states: usize,
    },

    /// A requested configuration cannot be realised, e.g. an I/O mode or
    /// ambiguity policy the target emitter has no rendering for.
    #[error("unsupported configuration: {reason}")]
    Unsupported {
        /// Human-readable explanation.
        reason: String,
    },

    /// The caller supplied a malformed FSM, e.g. attempted to determinise
    /// something without a start state.
    #[error("invalid input: {detail}")]
    InvalidInput {
        /// Human-readable explanation.
        detail: String,
    },

    /// An accepting state was reached with more than one distinct end id
    /// while the ambiguity policy in effect was `Error`.
    #[error("ambiguous match: end ids {end_ids:?} are all live under the Error policy")]
    AmbiguousEndIds {
        /// The conflicting end ids, in ascending order.
        end_ids: Vec<u32>,
    },
}

/// A specialised `Result` alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FsmError>;
