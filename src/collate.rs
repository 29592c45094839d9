//! End-state collation: merge every end state into a single one, reached by
//! epsilon edges from the originals.
//!
//! Grounded directly on `fsm_collateends`
//! (`original_source/src/libfsm/collate.c`): zero end states is left alone,
//! exactly one end state is left alone, and two or more are replaced by one
//! fresh end state epsilon-reachable from each of the originals, which in
//! turn stop being ends themselves.

use crate::alphabet::Label;
use crate::fsm::{Fsm, StateId};

/// Collates every end state of `fsm` into a single new one.
///
/// Returns the id of the (possibly newly created) single end state, or
/// `None` if `fsm` has no end states at all. The new end state's end-id set
/// is the union of all the collated states' end-id sets -- collation is
/// used internally by the emitter's STOP-merging pass, where provenance
/// still matters for ambiguity reporting, so it is not discarded here the
/// way `complement` discards it.
pub fn collate_ends(fsm: &mut Fsm) -> Option<StateId> {
    let ends: Vec<StateId> = fsm.end_states().collect();

    match ends.len() {
        0 => None,
        1 => Some(ends[0]),
        _ => {
            let merged = fsm.add_state();
            let mut ids = std::collections::BTreeSet::new();
            for &e in &ends {
                ids.extend(fsm.end_ids(e).iter().copied());
            }
            if !ids.is_empty() {
                fsm.set_end(merged, true);
                for id in ids {
                    fsm.add_end_id(merged, id);
                }
            } else {
                fsm.set_end(merged, true);
            }
            for &e in &ends {
                fsm.add_edge(e, Label::Epsilon, merged);
                fsm.set_end(e, false);
            }
            Some(merged)
        }
    }
}
