//! Reversal: flip every edge, swap start and end roles.
//!
//! Grounded on `Nfa::reversed` in the teacher (`markmerz-regex-dfa/src/nfa.rs`)
//! and on `Dfa::reversed` in the sibling automaton crate
//! (`other_examples/2def17ee_jneem-automaton__src-dfa.rs.rs`): both build a
//! fresh machine with every edge flipped, a single new start state epsilon-
//! linked to the old end states, and the old start state(s) becoming the new
//! end state(s).

use std::collections::BTreeSet;

use crate::alphabet::Label;
use crate::fsm::{Fsm, StateId};

/// Builds the machine accepting the reverse of `fsm`'s language.
///
/// The result is in general an NFA even when `fsm` was a DFA (a DFA can have
/// several states with an edge to the same destination on the same byte,
/// which become several outgoing edges on one label after reversal) and
/// carries a fresh synthetic start state, per `SPEC_FULL.md` §4.5.
pub fn reverse(fsm: &Fsm) -> Fsm {
    let mut out = Fsm::new();
    let mut old_to_new: Vec<StateId> = Vec::new();
    let mut max_id = 0;
    for id in fsm.state_ids() {
        max_id = max_id.max(id);
    }
    old_to_new.resize(max_id + 1, usize::MAX);

    for id in fsm.state_ids() {
        old_to_new[id] = out.add_state();
    }

    for id in fsm.state_ids() {
        let new_src = old_to_new[id];
        for (label, dst) in fsm.outgoing(id) {
            out.add_edge(old_to_new[dst], label, new_src);
        }
    }

    let new_start = out.add_state();
    out.set_start(new_start);
    for old_end in fsm.end_states() {
        out.add_edge(new_start, Label::Epsilon, old_to_new[old_end]);
    }

    if let Some(old_start) = fsm.get_start() {
        let new_end = old_to_new[old_start];
        out.set_end(new_end, true);
        out.union_end_ids(new_end, &fsm.end_ids(old_start).clone());
        // Reversal loses per-alternative provenance for states that were
        // never an end in the forward machine; the new end state only
        // carries ids that were already on the old start, which is usually
        // empty. Keep it as-is: SPEC_FULL.md does not require reversal to
        // invent end ids.
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::epsilon_closure;
    use crate::determinize::determinize;

    fn accepts(dfa: &Fsm, input: &[u8]) -> bool {
        let mut cur = dfa.get_start().unwrap();
        for &b in input {
            match dfa.edges(cur, Label::Byte(b)).next() {
                Some(next) => cur = next,
                None => return false,
            }
        }
        dfa.is_end(cur)
    }

    /// `ab` as a simple chain.
    fn ab() -> Fsm {
        let mut fsm = Fsm::new();
        let a = fsm.add_state();
        let b = fsm.add_state();
        let c = fsm.add_state();
        fsm.set_start(a);
        fsm.add_edge(a, Label::Byte(b'a'), b);
        fsm.add_edge(b, Label::Byte(b'b'), c);
        fsm.set_end(c, true);
        fsm
    }

    #[test]
    fn reverse_of_ab_accepts_ba() {
        let reversed = reverse(&ab());
        let dfa = determinize(&reversed, usize::MAX).unwrap();
        assert!(accepts(&dfa, b"ba"));
        assert!(!accepts(&dfa, b"ab"));
    }

    #[test]
    fn reverse_is_involutive_up_to_language() {
        let once = determinize(&reverse(&ab()), usize::MAX).unwrap();
        let twice = determinize(&reverse(&once), usize::MAX).unwrap();
        assert!(accepts(&twice, b"ab"));
        assert!(!accepts(&twice, b"ba"));
    }

    #[test]
    fn reverse_empty_fsm_has_only_synthetic_start() {
        let fsm = Fsm::new();
        let reversed = reverse(&fsm);
        assert_eq!(reversed.num_states(), 1);
        assert_eq!(
            epsilon_closure(&reversed, &BTreeSet::from([reversed.get_start().unwrap()])).len(),
            1
        );
    }
}
