//! The state graph: the core data model shared by every transformation in
//! this crate.
//!
//! States are indexed by position in a `Vec`, not linked by pointer (see
//! `DESIGN.md` for why): a removed state leaves a hole rather than shifting
//! the indices of its neighbours, so a `StateId` a caller is holding never
//! silently starts pointing at the wrong state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::alphabet::Label;

/// Identifies a single state within one `Fsm`. Not meaningful across
/// different `Fsm` values.
pub type StateId = usize;

/// An end id: an opaque tag carried by an accepting state, identifying which
/// alternative of e.g. a regex union matched. Callers that don't care about
/// provenance can ignore end ids entirely.
pub type EndId = u32;

#[derive(Clone, Debug, Default)]
struct State {
    /// Outgoing edges, keyed by label. An NFA may have several destinations
    /// per label; a DFA invariant (checked by `is_deterministic`, not
    /// enforced structurally) is at most one per byte label and none on
    /// epsilon.
    edges: BTreeMap<Label, BTreeSet<StateId>>,
    end: bool,
    end_ids: BTreeSet<EndId>,
}

/// A finite state machine: an ordered collection of states, a designated
/// (optional) start state, labelled edges, and end-id sets on accepting
/// states.
///
/// `Fsm` owns every state it contains; dropping an `Fsm` value releases the
/// whole graph, matching `free(fsm)` in the distilled specification -- there
/// is no separate free function.
#[derive(Clone, Default)]
pub struct Fsm {
    states: Vec<Option<State>>,
    start: Option<StateId>,
}

impl Fsm {
    /// An `Fsm` with no states and no start.
    pub fn new() -> Fsm {
        Fsm {
            states: Vec::new(),
            start: None,
        }
    }

    /// An `Fsm` with capacity for `n` states preallocated.
    pub fn with_capacity(n: usize) -> Fsm {
        Fsm {
            states: Vec::with_capacity(n),
            start: None,
        }
    }

    /// Adds a new, non-accepting state with no edges, and returns its id.
    pub fn add_state(&mut self) -> StateId {
        self.states.push(Some(State::default()));
        self.states.len() - 1
    }

    /// Removes a state and every edge referencing it (incoming and
    /// outgoing). If the removed state was the start state, the start is
    /// cleared.
    ///
    /// The ids of other states are unaffected: this leaves a hole rather
    /// than shifting later states down, so holding a `StateId` across a
    /// `remove_state` call on a *different* id remains valid.
    ///
    /// Panics if `id` does not refer to a live state.
    pub fn remove_state(&mut self, id: StateId) {
        self.check_live(id);
        self.states[id] = None;
        for slot in &mut self.states {
            if let Some(state) = slot {
                for dests in state.edges.values_mut() {
                    dests.remove(&id);
                }
                state.edges.retain(|_, dests| !dests.is_empty());
            }
        }
        if self.start == Some(id) {
            self.start = None;
        }
    }

    fn check_live(&self, id: StateId) {
        assert!(
            self.states.get(id).map_or(false, |s| s.is_some()),
            "state {} does not exist in this Fsm",
            id
        );
    }

    fn state(&self, id: StateId) -> &State {
        self.check_live(id);
        self.states[id].as_ref().unwrap()
    }

    fn state_mut(&mut self, id: StateId) -> &mut State {
        self.check_live(id);
        self.states[id].as_mut().unwrap()
    }

    /// Adds an edge `src --label--> dst`. Both states must already exist in
    /// this `Fsm` (adding an edge to a state from another automaton is a
    /// programming error, not a recoverable one, so it panics).
    pub fn add_edge(&mut self, src: StateId, label: Label, dst: StateId) {
        self.check_live(dst);
        self.state_mut(src).edges.entry(label).or_default().insert(dst);
    }

    /// Removes a single edge, if present.
    pub fn remove_edge(&mut self, src: StateId, label: Label, dst: StateId) {
        if let Some(dests) = self.state_mut(src).edges.get_mut(&label) {
            dests.remove(&dst);
            if dests.is_empty() {
                self.state_mut(src).edges.remove(&label);
            }
        }
    }

    /// Marks a state as accepting or non-accepting. Clearing the end flag
    /// also clears its end-id set (end ids may only be non-empty on
    /// accepting states).
    pub fn set_end(&mut self, id: StateId, end: bool) {
        let state = self.state_mut(id);
        state.end = end;
        if !end {
            state.end_ids.clear();
        }
    }

    /// True iff `id` is an accepting state.
    pub fn is_end(&self, id: StateId) -> bool {
        self.state(id).end
    }

    /// Attaches an end id to a state. Panics if the state is not accepting
    /// (set `end` with `set_end` first).
    pub fn add_end_id(&mut self, id: StateId, end_id: EndId) {
        let state = self.state_mut(id);
        assert!(state.end, "cannot attach an end id to a non-accepting state");
        state.end_ids.insert(end_id);
    }

    /// The end-id set attached to a state (empty if non-accepting or
    /// untagged).
    pub fn end_ids(&self, id: StateId) -> &BTreeSet<EndId> {
        &self.state(id).end_ids
    }

    /// Unions `ids` into the end-id set of `id`, marking it accepting if it
    /// was not already.
    pub fn union_end_ids(&mut self, id: StateId, ids: &BTreeSet<EndId>) {
        let state = self.state_mut(id);
        state.end = true;
        state.end_ids.extend(ids.iter().copied());
    }

    /// Sets the start state.
    pub fn set_start(&mut self, id: StateId) {
        self.check_live(id);
        self.start = Some(id);
    }

    /// The start state, if one has been set.
    pub fn get_start(&self) -> Option<StateId> {
        self.start
    }

    /// The number of live states (holes left by `remove_state` are not
    /// counted).
    pub fn num_states(&self) -> usize {
        self.states.iter().filter(|s| s.is_some()).count()
    }

    /// Iterates over the ids of every live state, in ascending order.
    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
    }

    /// Iterates over the ids of every accepting state, in ascending order.
    pub fn end_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.state_ids().filter(move |&id| self.is_end(id))
    }

    /// The destinations of `src` under `label` (empty if there are none).
    pub fn edges(&self, src: StateId, label: Label) -> impl Iterator<Item = StateId> + '_ {
        self.state(src)
            .edges
            .get(&label)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// All outgoing edges of `src`, as `(label, destination)` pairs, sorted
    /// by label.
    pub fn outgoing(&self, src: StateId) -> impl Iterator<Item = (Label, StateId)> + '_ {
        self.state(src)
            .edges
            .iter()
            .flat_map(|(&label, dests)| dests.iter().map(move |&d| (label, d)))
    }

    /// True iff `src` has at least one epsilon edge.
    pub fn has_epsilon_edges(&self, src: StateId) -> bool {
        self.state(src)
            .edges
            .get(&Label::Epsilon)
            .map_or(false, |s| !s.is_empty())
    }

    /// True iff this machine has no epsilon edges and at most one
    /// destination per `(state, byte)` pair.
    pub fn is_deterministic(&self) -> bool {
        self.state_ids().all(|id| {
            let state = self.state(id);
            !state.edges.contains_key(&Label::Epsilon)
                && state.edges.iter().all(|(label, dests)| {
                    label.is_epsilon() || dests.len() <= 1
                })
        })
    }

    /// True iff every `(state, byte)` pair has exactly one destination --
    /// the invariant required of a *complete* DFA.
    pub fn is_complete(&self) -> bool {
        self.is_deterministic()
            && self.state_ids().all(|id| {
                (0u16..256).all(|b| self.edges(id, Label::Byte(b as u8)).next().is_some())
            })
    }
}

impl fmt::Debug for Fsm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Fsm ({} states):", self.num_states())?;
        writeln!(f, "  start: {:?}", self.start)?;
        for id in self.state_ids() {
            let state = self.state(id);
            writeln!(
                f,
                "  state {}{}{}",
                id,
                if state.end { " [end" } else { "" },
                if state.end {
                    format!(" {:?}]", state.end_ids)
                } else {
                    String::new()
                }
            )?;
            for (label, dest) in self.outgoing(id) {
                writeln!(f, "    {:?} -> {}", label, dest)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_query_states() {
        let mut fsm = Fsm::new();
        let a = fsm.add_state();
        let b = fsm.add_state();
        fsm.set_start(a);
        fsm.add_edge(a, Label::Byte(b'x'), b);
        fsm.set_end(b, true);
        fsm.add_end_id(b, 7);

        assert_eq!(fsm.get_start(), Some(a));
        assert!(fsm.is_end(b));
        assert_eq!(fsm.end_ids(b), &BTreeSet::from([7]));
        assert_eq!(fsm.edges(a, Label::Byte(b'x')).collect::<Vec<_>>(), vec![b]);
        assert!(fsm.is_deterministic());
    }

    #[test]
    fn remove_state_preserves_other_ids_and_drops_edges() {
        let mut fsm = Fsm::new();
        let a = fsm.add_state();
        let b = fsm.add_state();
        let c = fsm.add_state();
        fsm.add_edge(a, Label::Byte(1), b);
        fsm.add_edge(b, Label::Byte(2), c);
        fsm.set_start(a);

        fsm.remove_state(b);

        assert_eq!(fsm.num_states(), 2);
        assert_eq!(fsm.edges(a, Label::Byte(1)).count(), 0);
        assert!(fsm.state_ids().collect::<Vec<_>>().contains(&c));
        assert_eq!(fsm.get_start(), Some(a));
    }

    #[test]
    fn clearing_end_clears_end_ids() {
        let mut fsm = Fsm::new();
        let a = fsm.add_state();
        fsm.set_end(a, true);
        fsm.add_end_id(a, 1);
        fsm.set_end(a, false);
        assert!(fsm.end_ids(a).is_empty());
    }

    #[test]
    #[should_panic]
    fn add_end_id_to_non_accepting_panics() {
        let mut fsm = Fsm::new();
        let a = fsm.add_state();
        fsm.add_end_id(a, 1);
    }

    #[test]
    fn nfa_with_multiple_destinations_is_not_deterministic() {
        let mut fsm = Fsm::new();
        let a = fsm.add_state();
        let b = fsm.add_state();
        let c = fsm.add_state();
        fsm.add_edge(a, Label::Byte(1), b);
        fsm.add_edge(a, Label::Byte(1), c);
        assert!(!fsm.is_deterministic());
    }
}
