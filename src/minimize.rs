//! DFA minimisation by Hopcroft-style partition refinement.
//!
//! Grounded on the distinguisher-worklist algorithm used by this author's
//! sibling automaton crate (`Dfa::minimize` in the retrieval pack), adapted
//! from character ranges to the fixed byte alphabet and generalised so that
//! states are first separated by their full end-id set rather than a single
//! boolean accept flag -- see `SPEC_FULL.md` §4.4 for why: two accepting
//! states that carry different acceptance provenance must never be merged,
//! even if they are otherwise indistinguishable by the language they
//! recognise from that point on.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::alphabet::Label;
use crate::fsm::{EndId, Fsm, StateId};

/// A reverse index from `(byte, destination)` to the set of states with an
/// edge on that byte leading to that destination. Built once per
/// minimisation run and queried once per distinguisher per byte.
struct ReverseIndex {
    by_byte: Vec<BTreeMap<StateId, Vec<StateId>>>,
}

impl ReverseIndex {
    fn build(dfa: &Fsm) -> ReverseIndex {
        let mut by_byte = vec![BTreeMap::new(); 256];
        for s in dfa.state_ids() {
            for (label, dest) in dfa.outgoing(s) {
                if let Some(b) = label.byte() {
                    by_byte[b as usize].entry(dest).or_insert_with(Vec::new).push(s);
                }
            }
        }
        ReverseIndex { by_byte }
    }

    fn predecessors(&self, b: u8, dest: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.by_byte[b as usize].get(&dest).into_iter().flatten().copied()
    }
}

/// Returns the unique (up to isomorphism) minimal DFA equivalent to `dfa`.
///
/// `dfa` must already be deterministic (no epsilon edges, at most one
/// destination per byte); this is a programmer invariant, checked with an
/// assertion rather than a recoverable error, per the error-handling design.
pub fn minimize(dfa: &Fsm) -> Fsm {
    assert!(dfa.is_deterministic(), "minimize requires a deterministic Fsm");

    let start = match dfa.get_start() {
        Some(s) => s,
        None => return Fsm::new(),
    };

    let mut initial: BTreeMap<(bool, BTreeSet<EndId>), BTreeSet<StateId>> = BTreeMap::new();
    for s in dfa.state_ids() {
        let key = (dfa.is_end(s), dfa.end_ids(s).clone());
        initial.entry(key).or_default().insert(s);
    }

    let mut partition: Vec<BTreeSet<StateId>> = initial.values().cloned().collect();
    let mut distinguishers: BTreeSet<BTreeSet<StateId>> = partition.iter().cloned().collect();
    let reversed = ReverseIndex::build(dfa);

    while let Some(dist) = pop_arbitrary(&mut distinguishers) {
        for b in 0u16..256 {
            let b = b as u8;
            let preimage: BTreeSet<StateId> =
                dist.iter().flat_map(|&s| reversed.predecessors(b, s)).collect();
            if preimage.is_empty() {
                continue;
            }

            let mut next_partition = Vec::with_capacity(partition.len());
            for y in &partition {
                let y0: BTreeSet<StateId> = y.intersection(&preimage).copied().collect();
                let y1: BTreeSet<StateId> = y.difference(&preimage).copied().collect();

                if y0.is_empty() || y1.is_empty() {
                    next_partition.push(y.clone());
                    continue;
                }

                if distinguishers.contains(y) {
                    distinguishers.remove(y);
                    distinguishers.insert(y0.clone());
                    distinguishers.insert(y1.clone());
                } else if y0.len() <= y1.len() {
                    distinguishers.insert(y0.clone());
                } else {
                    distinguishers.insert(y1.clone());
                }

                next_partition.push(y0);
                next_partition.push(y1);
            }
            partition = next_partition;
        }
    }

    debug!(
        "minimize: {} states refined into {} partition blocks",
        dfa.num_states(),
        partition.len()
    );
    build_from_partition(dfa, &partition, start)
}

fn pop_arbitrary(set: &mut BTreeSet<BTreeSet<StateId>>) -> Option<BTreeSet<StateId>> {
    let item = set.iter().next().cloned();
    if let Some(ref it) = item {
        set.remove(it);
    }
    item
}

fn build_from_partition(dfa: &Fsm, partition: &[BTreeSet<StateId>], start: StateId) -> Fsm {
    let mut out = Fsm::new();
    let mut old_to_new: BTreeMap<StateId, StateId> = BTreeMap::new();

    for class in partition {
        // Safe: the partitioning step never produces an empty class.
        let rep = *class.iter().next().unwrap();
        let new_id = out.add_state();
        if dfa.is_end(rep) {
            out.set_end(new_id, true);
            for id in dfa.end_ids(rep) {
                out.add_end_id(new_id, *id);
            }
        }
        for &old in class {
            old_to_new.insert(old, new_id);
        }
    }

    for class in partition {
        let rep = *class.iter().next().unwrap();
        let new_src = old_to_new[&rep];
        for (label, old_dst) in dfa.outgoing(rep) {
            out.add_edge(new_src, label, old_to_new[&old_dst]);
        }
    }

    out.set_start(old_to_new[&start]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinize::determinize;

    /// `.*foo.*` as an NFA: an unconditional self-loop on any byte, plus a
    /// literal `foo` chain into an always-accepting state.
    fn dot_star_foo_dot_star() -> Fsm {
        let mut nfa = Fsm::new();
        let s0 = nfa.add_state();
        nfa.set_start(s0);
        for b in 0u16..256 {
            nfa.add_edge(s0, Label::Byte(b as u8), s0);
        }
        let f = nfa.add_state();
        let fo = nfa.add_state();
        let foo = nfa.add_state();
        nfa.add_edge(s0, Label::Byte(b'f'), f);
        nfa.add_edge(f, Label::Byte(b'o'), fo);
        nfa.add_edge(fo, Label::Byte(b'o'), foo);
        nfa.set_end(foo, true);
        for b in 0u16..256 {
            nfa.add_edge(foo, Label::Byte(b as u8), foo);
        }
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
    fn minimize_collapses_dot_star_foo_dot_star() {
        let dfa = determinize(&dot_star_foo_dot_star(), usize::MAX).unwrap();
        let min = minimize(&dfa);
        assert!(min.num_states() <= 4);
        assert!(accepts(&min, b"xxfooxx"));
        assert!(!accepts(&min, b"xxfoxx"));
    }

    #[test]
    fn minimize_preserves_end_ids_strictly() {
        // Two states that are otherwise equivalent (both immediately
        // accept with no outgoing edges) but carry different end ids must
        // not be merged.
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        let a = nfa.add_state();
        let b = nfa.add_state();
        nfa.set_start(s);
        nfa.add_edge(s, Label::Byte(b'a'), a);
        nfa.add_edge(s, Label::Byte(b'b'), b);
        nfa.set_end(a, true);
        nfa.add_end_id(a, 1);
        nfa.set_end(b, true);
        nfa.add_end_id(b, 2);

        let dfa = determinize(&nfa, usize::MAX).unwrap();
        let min = minimize(&dfa);
        assert_eq!(min.num_states(), 3);

        let start = min.get_start().unwrap();
        let after_a = min.edges(start, Label::Byte(b'a')).next().unwrap();
        let after_b = min.edges(start, Label::Byte(b'b')).next().unwrap();
        assert_eq!(min.end_ids(after_a), &BTreeSet::from([1]));
        assert_eq!(min.end_ids(after_b), &BTreeSet::from([2]));
    }

    #[test]
    fn minimize_is_idempotent_on_state_count() {
        let dfa = determinize(&dot_star_foo_dot_star(), usize::MAX).unwrap();
        let once = minimize(&dfa);
        let twice = minimize(&once);
        assert_eq!(once.num_states(), twice.num_states());
    }
}
