//! Completion (adding an explicit trap state for missing transitions) and
//! complementation, grounded directly on
//! `original_source/src/libfsm/complement.c`.

use crate::alphabet::Label;
use crate::fsm::{Fsm, StateId};
use crate::trim::{trim, TrimKind};

/// Adds a non-accepting trap state and routes every missing `(state, byte)`
/// transition to it, so that every state has exactly one destination for
/// every byte.
///
/// A no-op if `fsm` is already complete. Returns the id of the trap state
/// that was added, or `None` if none was needed.
pub fn complete(fsm: &mut Fsm) -> Option<StateId> {
    if fsm.is_complete() {
        return None;
    }

    let trap = fsm.add_state();
    for b in 0u16..256 {
        fsm.add_edge(trap, Label::Byte(b as u8), trap);
    }

    for id in fsm.state_ids().collect::<Vec<_>>() {
        if id == trap {
            continue;
        }
        for b in 0u16..256 {
            let b = b as u8;
            if fsm.edges(id, Label::Byte(b)).next().is_none() {
                fsm.add_edge(id, Label::Byte(b), trap);
            }
        }
    }

    Some(trap)
}

/// Builds the complement of `dfa`'s language: completes it if necessary,
/// flips every state's accept flag, then trims states no longer reachable
/// from the start.
///
/// Per `fsm_complement`: completion comes first so that flipping accept bits
/// is sound (an incomplete machine has implicit "stuck" behaviour on missing
/// transitions that flipping bits alone would not account for), and the
/// trim afterwards only removes unreachable states, not states that can no
/// longer reach an end -- the complement of a total machine has no such
/// states by construction.
///
/// Complementing loses end-id provenance: the flipped-on states have no
/// natural end id to carry, so they come out untagged. Callers that need
/// ids on a complemented machine should assign their own afterwards.
pub fn complement(dfa: &mut Fsm) {
    assert!(dfa.is_deterministic(), "complement requires a deterministic Fsm");
    complete(dfa);
    for id in dfa.state_ids().collect::<Vec<_>>() {
        let was_end = dfa.is_end(id);
        dfa.set_end(id, !was_end);
    }
    trim(dfa, TrimKind::StartReachable);
}
