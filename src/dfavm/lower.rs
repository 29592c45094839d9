//! Lowering a deterministic `Fsm` into a flat [`DfaOp`] program.
//!
//! For each state: a `Fetch` -- the state's actual entry point -- whose
//! `on_empty` destination is the `Stop` immediately following it (what "ran
//! out of input here" means for this state), then a chain of branch ops
//! built from [`crate::alphabet::ByteSet::ranges`], falling through to a
//! final unconditional `Stop { end_bits: Fail }` for any byte no range
//! claims (reachable only when the source `Fsm` is incomplete). A state
//! with no outgoing byte edges that isn't accepting can never do anything
//! but reject, however much input remains, so it collapses to that single
//! `Stop` directly with no `Fetch` at all.
//!
//! States are visited start-first, so the start state's `Fetch` (or, in the
//! all-reject-immediately degenerate case, its lone `Stop`) lands at op
//! index 0 -- execution always begins there, never at a `Stop` belonging to
//! some other state. This mirrors `print_fetch` / `print_end` in
//! `original_source/src/libfsm/print/go.c`, which inline a state's
//! end-of-input result into its own fetch rather than routing through a
//! stop placed ahead of it.
//!
//! The per-range branch encoding is two ops when the range doesn't start at
//! 0 (skip past the range with `Lt`, then match it with `Le`/`Eq`/`Ge`), or
//! one when it does (no lower bound to guard) -- generalised from single
//! bytes to fused ranges from the same source.

use std::collections::{BTreeMap, VecDeque};

use crate::alphabet::Label;
use crate::dfavm::op::{Cmp, Dest, DfaOp, EndBits, OpKind};
use crate::fsm::{EndId, Fsm, StateId};

/// Tunables for [`lower_with`] that a caller may want to drive from
/// [`crate::emit::EmitOptions`] without this module depending on the emit
/// layer.
#[derive(Clone, Copy, Debug)]
pub struct LowerOptions {
    /// Fuse contiguous destination bytes into a single ranged comparison
    /// (`true`, the default) rather than emitting one branch per byte.
    pub consolidate_edges: bool,
}

impl Default for LowerOptions {
    fn default() -> LowerOptions {
        LowerOptions {
            consolidate_edges: true,
        }
    }
}

/// Lowers `fsm` into a flat matcher program using [`LowerOptions::default`].
pub fn lower(fsm: &Fsm) -> Vec<DfaOp> {
    lower_with(fsm, &LowerOptions::default())
}

/// Lowers `fsm` into a flat matcher program.
///
/// `fsm` must be deterministic. States are visited in ascending `StateId`
/// order with the start state first, so op index 0 is always the start
/// state's own entry op.
pub fn lower_with(fsm: &Fsm, opts: &LowerOptions) -> Vec<DfaOp> {
    assert!(fsm.is_deterministic(), "lower requires a deterministic Fsm");

    let start = match fsm.get_start() {
        Some(s) => s,
        None => {
            return vec![DfaOp {
                index: 0,
                num_incoming: 0,
                example: None,
                origin_state: None,
                kind: OpKind::Stop {
                    end_bits: EndBits::Fail,
                    end_ids: Vec::new(),
                },
            }]
        }
    };

    let mut order: Vec<StateId> = vec![start];
    order.extend(fsm.state_ids().filter(|&s| s != start));

    let paths = shortest_paths(fsm, start);

    let mut ops: Vec<DfaOp> = Vec::new();
    let mut entry: BTreeMap<StateId, usize> = BTreeMap::new();

    for &s in &order {
        let has_byte_edges = fsm.outgoing(s).any(|(label, _)| label.byte().is_some());

        if !has_byte_edges && !fsm.is_end(s) {
            // No transition can ever change the outcome from here: reject
            // immediately instead of fetching a byte only to reject anyway.
            let idx = ops.len();
            entry.insert(s, idx);
            ops.push(DfaOp {
                index: idx,
                num_incoming: 0,
                example: paths.get(&s).cloned(),
                origin_state: Some(s),
                kind: OpKind::Stop {
                    end_bits: EndBits::Fail,
                    end_ids: Vec::new(),
                },
            });
            continue;
        }

        let end_ids: Vec<EndId> = fsm.end_ids(s).iter().copied().collect();
        let fetch_index = ops.len();
        let stop_index = fetch_index + 1;
        entry.insert(s, fetch_index);
        ops.push(DfaOp {
            index: fetch_index,
            num_incoming: 0,
            example: paths.get(&s).cloned(),
            origin_state: Some(s),
            kind: OpKind::Fetch {
                on_empty: Dest::Op(stop_index),
            },
        });
        ops.push(DfaOp {
            index: stop_index,
            num_incoming: 0,
            example: paths.get(&s).cloned(),
            origin_state: Some(s),
            kind: OpKind::Stop {
                end_bits: if fsm.is_end(s) {
                    EndBits::Accept
                } else {
                    EndBits::Fail
                },
                end_ids,
            },
        });

        emit_branches(fsm, s, &paths, opts, &mut ops);
    }

    resolve_forward_refs(&mut ops, &entry);
    count_incoming(&mut ops);
    ops
}

/// The shortest sequence of bytes reaching each state from `start`, by BFS
/// over byte edges (epsilon-free, since `fsm` is deterministic). Ties are
/// broken by `Fsm::outgoing`'s ascending-label order, so the path chosen is
/// also lexicographically least among shortest.
fn shortest_paths(fsm: &Fsm, start: StateId) -> BTreeMap<StateId, Vec<u8>> {
    let mut paths: BTreeMap<StateId, Vec<u8>> = BTreeMap::new();
    paths.insert(start, Vec::new());
    let mut queue: VecDeque<StateId> = VecDeque::new();
    queue.push_back(start);
    while let Some(s) = queue.pop_front() {
        let prefix = paths[&s].clone();
        for (label, dest) in fsm.outgoing(s) {
            if let Some(b) = label.byte() {
                if !paths.contains_key(&dest) {
                    let mut extended = prefix.clone();
                    extended.push(b);
                    paths.insert(dest, extended);
                    queue.push_back(dest);
                }
            }
        }
    }
    paths
}

/// Groups `s`'s outgoing byte edges by destination, optionally fuses each
/// destination's bytes into contiguous ranges, and emits a skip-then-match
/// branch pair per range (ascending by lower bound), ending with a
/// fallthrough `Stop` for any byte left unclaimed.
fn emit_branches(
    fsm: &Fsm,
    s: StateId,
    paths: &BTreeMap<StateId, Vec<u8>>,
    opts: &LowerOptions,
    ops: &mut Vec<DfaOp>,
) {
    let mut by_dest: BTreeMap<StateId, crate::alphabet::ByteSet> = BTreeMap::new();
    for (label, dest) in fsm.outgoing(s) {
        if let Some(b) = label.byte() {
            by_dest.entry(dest).or_insert_with(crate::alphabet::ByteSet::new).insert(b);
        }
    }
    let _ = Label::Epsilon; // epsilon edges have no byte and are never lowered here.

    let mut ranges: Vec<(u8, u8, StateId)> = Vec::new();
    for (&dest, set) in &by_dest {
        if opts.consolidate_edges {
            for (lo, hi) in set.ranges() {
                ranges.push((lo, hi, dest));
            }
        } else {
            for b in set.iter() {
                ranges.push((b, b, dest));
            }
        }
    }
    ranges.sort_by_key(|&(lo, _, _)| lo);

    let base = paths.get(&s).cloned().unwrap_or_default();

    for (lo, hi, dest) in ranges {
        if lo > 0 {
            ops.push(DfaOp {
                index: ops.len(),
                num_incoming: 0,
                example: None,
                origin_state: Some(s),
                kind: OpKind::Branch {
                    cmp: Cmp::Lt,
                    arg: lo,
                    range: None,
                    dest: Dest::Op(ops.len() + 2),
                },
            });
        }
        let (cmp, arg) = if lo == hi {
            (Cmp::Eq, lo)
        } else if hi == u8::MAX {
            (Cmp::Ge, lo)
        } else {
            (Cmp::Le, hi)
        };
        let mut example = base.clone();
        example.push(lo);
        ops.push(DfaOp {
            index: ops.len(),
            num_incoming: 0,
            example: Some(example),
            origin_state: Some(s),
            kind: OpKind::Branch {
                cmp,
                arg,
                range: if lo != hi { Some((lo, hi)) } else { None },
                dest: Dest::State(dest),
            },
        });
    }

    ops.push(DfaOp {
        index: ops.len(),
        num_incoming: 0,
        example: None,
        origin_state: Some(s),
        kind: OpKind::Stop {
            end_bits: EndBits::Fail,
            end_ids: Vec::new(),
        },
    });
}

fn resolve_forward_refs(ops: &mut [DfaOp], entry: &BTreeMap<StateId, usize>) {
    for op in ops.iter_mut() {
        match &mut op.kind {
            OpKind::Fetch { on_empty } => resolve_dest(on_empty, entry),
            OpKind::Branch { dest, .. } => resolve_dest(dest, entry),
            OpKind::Stop { .. } => {}
        }
    }
}

fn resolve_dest(dest: &mut Dest, entry: &BTreeMap<StateId, usize>) {
    if let Dest::State(s) = *dest {
        *dest = Dest::Op(entry[&s]);
    }
}

fn count_incoming(ops: &mut [DfaOp]) {
    let mut counts = vec![0usize; ops.len()];
    for op in ops.iter() {
        let target = match &op.kind {
            OpKind::Fetch { on_empty: Dest::Op(i) } => Some(*i),
            OpKind::Branch { dest: Dest::Op(i), .. } => Some(*i),
            _ => None,
        };
        if let Some(i) = target {
            counts[i] += 1;
        }
    }
    for (op, count) in ops.iter_mut().zip(counts) {
        op.num_incoming = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinize::determinize;

    fn a_or_b() -> Fsm {
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        let a = nfa.add_state();
        nfa.set_start(s);
        nfa.add_edge(s, Label::Byte(b'a'), a);
        nfa.add_edge(s, Label::Byte(b'b'), a);
        nfa.set_end(a, true);
        nfa
    }

    fn a_star() -> Fsm {
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        nfa.set_start(s);
        nfa.set_end(s, true);
        nfa.add_edge(s, Label::Byte(b'a'), s);
        nfa
    }

    #[test]
    fn lowers_without_dangling_state_refs() {
        let dfa = determinize(&a_or_b(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        for op in &ops {
            match &op.kind {
                OpKind::Fetch { on_empty } => assert!(matches!(on_empty, Dest::Op(_))),
                OpKind::Branch { dest, .. } => assert!(matches!(dest, Dest::Op(_))),
                OpKind::Stop { .. } => {}
            }
        }
    }

    #[test]
    fn op_zero_is_the_start_states_fetch() {
        let dfa = determinize(&a_or_b(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        assert!(matches!(ops[0].kind, OpKind::Fetch { .. }));
        assert_eq!(ops[0].origin_state, dfa.get_start());
    }

    #[test]
    fn a_star_loops_back_through_its_own_fetch() {
        // A single self-looping accepting state: op 0 must be its Fetch,
        // and the 'a' branch must eventually lead back to op 0, not to a
        // Stop placed ahead of it.
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        assert!(matches!(ops[0].kind, OpKind::Fetch { .. }));
        let loops_back = ops.iter().any(|op| match &op.kind {
            OpKind::Branch { dest: Dest::Op(0), .. } => true,
            _ => false,
        });
        assert!(loops_back, "the 'a' edge should dispatch back to op 0's fetch");
    }

    #[test]
    fn fuses_contiguous_destination_bytes_into_one_range() {
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        let a = nfa.add_state();
        nfa.set_start(s);
        for b in b'a'..=b'z' {
            nfa.add_edge(s, Label::Byte(b), a);
        }
        nfa.set_end(a, true);
        let dfa = determinize(&nfa, usize::MAX).unwrap();
        let ops = lower(&dfa);

        let branch_count = ops
            .iter()
            .filter(|op| matches!(op.kind, OpKind::Branch { .. }))
            .count();
        // One range -> one match branch (lo == 'a' > 0 so also one skip branch).
        assert_eq!(branch_count, 2);
    }

    #[test]
    fn consolidate_edges_off_splits_ranges_into_single_bytes() {
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        let a = nfa.add_state();
        nfa.set_start(s);
        for b in b'a'..=b'c' {
            nfa.add_edge(s, Label::Byte(b), a);
        }
        nfa.set_end(a, true);
        let dfa = determinize(&nfa, usize::MAX).unwrap();
        let ops = lower_with(
            &dfa,
            &LowerOptions {
                consolidate_edges: false,
            },
        );

        let match_branches = ops
            .iter()
            .filter(|op| matches!(op.kind, OpKind::Branch { cmp: Cmp::Eq, .. }))
            .count();
        assert_eq!(match_branches, 3);
    }

    #[test]
    fn unconditionally_rejecting_state_collapses_to_one_stop() {
        // A single non-accepting state with no outgoing edges: the DFA for
        // the empty language. Reject is certain no matter what follows, so
        // there is nothing to fetch.
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        nfa.set_start(s);
        let dfa = determinize(&nfa, usize::MAX).unwrap();
        let ops = lower(&dfa);
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            ops[0].kind,
            OpKind::Stop {
                end_bits: EndBits::Fail,
                ..
            }
        ));
    }

    #[test]
    fn example_is_the_shortest_path_reaching_each_op() {
        let dfa = determinize(&a_or_b(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        assert_eq!(ops[0].example, Some(Vec::new()));
        let match_with_a = ops.iter().find(|op| {
            matches!(&op.kind, OpKind::Branch { range: None, dest: Dest::Op(_), cmp: Cmp::Eq, arg } if *arg == b'a')
        });
        assert_eq!(match_with_a.unwrap().example, Some(vec![b'a']));
    }

    #[test]
    fn empty_fsm_lowers_to_a_single_reject_stop() {
        let ops = lower(&Fsm::new());
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            ops[0].kind,
            OpKind::Stop {
                end_bits: EndBits::Fail,
                ..
            }
        ));
    }
}
