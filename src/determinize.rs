//! Subset construction: turn an arbitrary state graph into an equivalent DFA
//! with no epsilon edges.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::alphabet::Label;
use crate::error::{FsmError, Result};
use crate::fsm::{Fsm, StateId};

use crate::closure::epsilon_closure;

/// A subset of NFA states; the unit of identity for DFA states during
/// construction.
type Subset = BTreeSet<StateId>;

/// Builds the DFA (no epsilon edges, at most one destination per byte per
/// state) that accepts the same language as `nfa`.
///
/// Construction is worklist-driven subset construction (see
/// `SPEC_FULL.md` §4.3): the start subset is the epsilon closure of the
/// NFA's start state, and each popped subset is extended one byte at a
/// time, merging the epsilon closures of all members' destinations.
///
/// Fails with [`FsmError::TooManyStates`] if the number of distinct subsets
/// discovered would exceed `max_states`; `nfa` itself is left untouched.
pub fn determinize(nfa: &Fsm, max_states: usize) -> Result<Fsm> {
    let start = match nfa.get_start() {
        Some(s) => s,
        None => return Ok(Fsm::new()),
    };

    let mut dfa = Fsm::new();
    let mut subset_to_dfa: BTreeMap<Subset, StateId> = BTreeMap::new();
    let mut worklist: Vec<Subset> = Vec::new();

    let mut add_subset = |subset: Subset,
                           dfa: &mut Fsm,
                           subset_to_dfa: &mut BTreeMap<Subset, StateId>,
                           worklist: &mut Vec<Subset>|
     -> Result<StateId> {
        if let Some(&id) = subset_to_dfa.get(&subset) {
            return Ok(id);
        }
        if dfa.num_states() >= max_states {
            return Err(FsmError::TooManyStates { max_states });
        }
        let id = dfa.add_state();
        mark_end(nfa, &subset, dfa, id);
        subset_to_dfa.insert(subset.clone(), id);
        worklist.push(subset);
        Ok(id)
    };

    let mut start_set = BTreeSet::new();
    start_set.insert(start);
    let start_closure = epsilon_closure(nfa, &start_set);
    let start_id = add_subset(start_closure, &mut dfa, &mut subset_to_dfa, &mut worklist)?;
    dfa.set_start(start_id);

    while let Some(subset) = worklist.pop() {
        let src_id = *subset_to_dfa.get(&subset).unwrap();

        for b in 0u16..256 {
            let b = b as u8;
            let moved: Subset = subset
                .iter()
                .flat_map(|&s| nfa.edges(s, Label::Byte(b)))
                .collect();
            if moved.is_empty() {
                continue;
            }
            let target = epsilon_closure(nfa, &moved);
            if target.is_empty() {
                continue;
            }
            let dst_id = add_subset(target, &mut dfa, &mut subset_to_dfa, &mut worklist)?;
            dfa.add_edge(src_id, Label::Byte(b), dst_id);
        }
    }

    debug!(
        "determinize: {} NFA states became {} DFA states",
        nfa.num_states(),
        dfa.num_states()
    );
    Ok(dfa)
}

/// A DFA state for subset `S` is an end iff any member of `S` is an end;
/// its end-id set is the union of the end-id sets of the end members.
fn mark_end(nfa: &Fsm, subset: &Subset, dfa: &mut Fsm, dfa_state: StateId) {
    let mut ids = BTreeSet::new();
    let mut any_end = false;
    for &s in subset {
        if nfa.is_end(s) {
            any_end = true;
            ids.extend(nfa.end_ids(s).iter().copied());
        }
    }
    if any_end {
        dfa.set_end(dfa_state, true);
        for id in ids {
            dfa.add_end_id(dfa_state, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an NFA for `ab*c` with an epsilon-driven `b*` loop, matching
    /// the crate's end-to-end scenario 1.
    fn ab_star_c() -> Fsm {
        let mut nfa = Fsm::new();
        let s0 = nfa.add_state();
        let s1 = nfa.add_state();
        let s2 = nfa.add_state();
        let s3 = nfa.add_state();
        nfa.set_start(s0);
        nfa.add_edge(s0, Label::Byte(b'a'), s1);
        nfa.add_edge(s1, Label::Epsilon, s2);
        nfa.add_edge(s2, Label::Byte(b'b'), s2);
        nfa.add_edge(s2, Label::Epsilon, s3);
        nfa.add_edge(s3, Label::Byte(b'c'), {
            let accept = nfa.add_state();
            nfa.set_end(accept, true);
            accept
        });
        nfa
    }

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

    #[test]
    fn determinize_removes_epsilons() {
        let dfa = determinize(&ab_star_c(), usize::MAX).unwrap();
        assert!(dfa.is_deterministic());
    }

    #[test]
    fn determinize_preserves_language() {
        let dfa = determinize(&ab_star_c(), usize::MAX).unwrap();
        assert!(accepts(&dfa, b"ac"));
        assert!(accepts(&dfa, b"abbbc"));
        assert!(!accepts(&dfa, b"ab"));
        assert!(!accepts(&dfa, b""));
    }

    #[test]
    fn determinize_respects_state_budget() {
        assert!(determinize(&ab_star_c(), 1).is_err());
        assert!(determinize(&ab_star_c(), 100).is_ok());
    }

    #[test]
    fn determinize_unions_end_ids() {
        // a|b with end ids {1 on a, 2 on b}
        let mut nfa = Fsm::new();
        let start = nfa.add_state();
        let a_accept = nfa.add_state();
        let b_accept = nfa.add_state();
        nfa.set_start(start);
        nfa.add_edge(start, Label::Byte(b'a'), a_accept);
        nfa.add_edge(start, Label::Byte(b'b'), b_accept);
        nfa.set_end(a_accept, true);
        nfa.add_end_id(a_accept, 1);
        nfa.set_end(b_accept, true);
        nfa.add_end_id(b_accept, 2);

        let dfa = determinize(&nfa, usize::MAX).unwrap();
        let s = dfa.get_start().unwrap();
        let after_a = dfa.edges(s, Label::Byte(b'a')).next().unwrap();
        let after_b = dfa.edges(s, Label::Byte(b'b')).next().unwrap();
        assert_eq!(dfa.end_ids(after_a), &BTreeSet::from([1]));
        assert_eq!(dfa.end_ids(after_b), &BTreeSet::from([2]));
    }

    #[test]
    fn determinize_empty_fsm_has_no_start() {
        let dfa = determinize(&Fsm::new(), usize::MAX).unwrap();
        assert_eq!(dfa.get_start(), None);
        assert_eq!(dfa.num_states(), 0);
    }
}
