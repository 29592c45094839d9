//! Dead-state removal: drop states that are unreachable from the start, or
//! that can never reach an end state, or both.
//!
//! Grounded on `fsm_trim`'s `FSM_TRIM_START_REACHABLE` mode as used by
//! `fsm_complement` (`original_source/src/libfsm/complement.c`), generalised
//! to the symmetric end-reachable case using the same `reachable` primitive
//! `closure.rs` already provides for both directions.

use std::collections::BTreeSet;

use log::debug;

use crate::closure::{reachable, Direction};
use crate::fsm::{Fsm, StateId};

/// Which notion of liveness to trim by.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrimKind {
    /// Keep only states reachable from the start state.
    StartReachable,
    /// Keep only states that can reach some end state.
    EndReachable,
    /// Keep only states satisfying both.
    Both,
}

/// The result of a trim pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TrimOutcome {
    /// Number of states removed.
    pub removed: usize,
}

/// Removes dead states from `fsm` in place, per `kind`.
///
/// A machine with no start state is left untouched under
/// `TrimKind::StartReachable` or `TrimKind::Both` (there is nothing to be
/// reachable from); `TrimKind::EndReachable` alone still removes states that
/// cannot reach any end state even without a start.
pub fn trim(fsm: &mut Fsm, kind: TrimKind) -> TrimOutcome {
    let keep = match kind {
        TrimKind::StartReachable => match fsm.get_start() {
            Some(s) => reachable(fsm, &BTreeSet::from([s]), Direction::Forward),
            None => return TrimOutcome { removed: 0 },
        },
        TrimKind::EndReachable => {
            let ends: BTreeSet<StateId> = fsm.end_states().collect();
            reachable(fsm, &ends, Direction::Backward)
        }
        TrimKind::Both => {
            let start_reach = match fsm.get_start() {
                Some(s) => reachable(fsm, &BTreeSet::from([s]), Direction::Forward),
                None => return TrimOutcome { removed: 0 },
            };
            let ends: BTreeSet<StateId> = fsm.end_states().collect();
            let end_reach = reachable(fsm, &ends, Direction::Backward);
            start_reach.intersection(&end_reach).copied().collect()
        }
    };

    let to_remove: Vec<StateId> = fsm.state_ids().filter(|id| !keep.contains(id)).collect();
    let removed = to_remove.len();
    for id in to_remove {
        fsm.remove_state(id);
    }
    debug!("trim ({:?}): removed {} dead states", kind, removed);
    TrimOutcome { removed }
}
