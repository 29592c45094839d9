//! Epsilon closure and reachability, the traversal primitives used by
//! subset construction and trimming.

use std::collections::BTreeSet;

use crate::alphabet::Label;
use crate::fsm::{Fsm, StateId};

/// The direction to traverse edges in for [`reachable`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// Follow edges from source to destination.
    Forward,
    /// Follow edges from destination to source.
    Backward,
}

/// Returns the smallest set of states containing `states` that is closed
/// under epsilon transitions.
pub fn epsilon_closure(fsm: &Fsm, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
    let mut closure: BTreeSet<StateId> = states.clone();
    let mut frontier: Vec<StateId> = states.iter().copied().collect();

    while let Some(s) = frontier.pop() {
        for t in fsm.edges(s, Label::Epsilon) {
            if closure.insert(t) {
                frontier.push(t);
            }
        }
    }

    closure
}

/// Returns the set of states reachable from `from` by following labelled and
/// epsilon edges in `direction`.
///
/// `Direction::Forward` is ordinary forward reachability (used to find dead
/// code after trimming); `Direction::Backward` walks edges against their
/// direction (used to find which states can still reach an end state).
pub fn reachable(fsm: &Fsm, from: &BTreeSet<StateId>, direction: Direction) -> BTreeSet<StateId> {
    let mut seen: BTreeSet<StateId> = from.clone();
    let mut frontier: Vec<StateId> = from.iter().copied().collect();

    while let Some(s) = frontier.pop() {
        let neighbors: Vec<StateId> = match direction {
            Direction::Forward => fsm.outgoing(s).map(|(_, d)| d).collect(),
            Direction::Backward => predecessors(fsm, s).collect(),
        };
        for t in neighbors {
            if seen.insert(t) {
                frontier.push(t);
            }
        }
    }

    seen
}

/// All states with an edge (of any label) leading to `target`.
///
/// This is a linear scan rather than a maintained reverse index: the state
/// graph is rebuilt wholesale by every transformation that would otherwise
/// need to keep such an index consistent, so maintaining one here would only
/// pay for itself in code that doesn't exist.
fn predecessors(fsm: &Fsm, target: StateId) -> impl Iterator<Item = StateId> + '_ {
    fsm.state_ids()
        .filter(move |&s| fsm.outgoing(s).any(|(_, d)| d == target))
}
