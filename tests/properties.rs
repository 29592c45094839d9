//! Property tests for the crate's core invariants (see `SPEC_FULL.md` §8):
//! every transformation preserves the language except where it's
//! specifically meant to change it (`reverse`, `complement`), and none of
//! them ever panics on an arbitrary literal machine.

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

use fsmforge::alphabet::Label;
use fsmforge::{
    complement, determinize, execute, minimize, trim, AmbiguityPolicy, Fsm, TrimKind,
};

fn literal_fsm(s: &str) -> Fsm {
    let mut fsm = Fsm::new();
    let mut cur = fsm.add_state();
    fsm.set_start(cur);
    for b in s.bytes() {
        let next = fsm.add_state();
        fsm.add_edge(cur, Label::Byte(b), next);
        cur = next;
    }
    fsm.set_end(cur, true);
    fsm
}

fn accepts(dfa: &Fsm, input: &[u8]) -> bool {
    execute(dfa, &mut input.iter().copied(), AmbiguityPolicy::None)
        .unwrap()
        .matched
}

fn bounded(s: &str) -> bool {
    s.len() <= 12 && s.is_ascii()
}

#[quickcheck]
fn determinize_accepts_exactly_the_literal(s: String, probe: String) -> TestResult {
    if !bounded(&s) || !bounded(&probe) {
        return TestResult::discard();
    }
    let dfa = determinize(&literal_fsm(&s), usize::MAX).unwrap();
    TestResult::from_bool(accepts(&dfa, probe.as_bytes()) == (s == probe))
}

#[quickcheck]
fn minimize_preserves_the_language(s: String, probe: String) -> TestResult {
    if !bounded(&s) || !bounded(&probe) {
        return TestResult::discard();
    }
    let dfa = determinize(&literal_fsm(&s), usize::MAX).unwrap();
    let min = minimize(&dfa);
    TestResult::from_bool(accepts(&dfa, probe.as_bytes()) == accepts(&min, probe.as_bytes()))
}

#[quickcheck]
fn minimize_never_grows_the_state_count(s: String) -> TestResult {
    if !bounded(&s) {
        return TestResult::discard();
    }
    let dfa = determinize(&literal_fsm(&s), usize::MAX).unwrap();
    let min = minimize(&dfa);
    TestResult::from_bool(min.num_states() <= dfa.num_states())
}

#[quickcheck]
fn double_complement_is_the_identity(s: String, probe: String) -> TestResult {
    if !bounded(&s) || !bounded(&probe) {
        return TestResult::discard();
    }
    let mut dfa = determinize(&literal_fsm(&s), usize::MAX).unwrap();
    let before = accepts(&dfa, probe.as_bytes());
    complement(&mut dfa);
    complement(&mut dfa);
    TestResult::from_bool(accepts(&dfa, probe.as_bytes()) == before)
}

#[quickcheck]
fn complement_inverts_acceptance(s: String, probe: String) -> TestResult {
    if !bounded(&s) || !bounded(&probe) {
        return TestResult::discard();
    }
    let mut dfa = determinize(&literal_fsm(&s), usize::MAX).unwrap();
    let before = accepts(&dfa, probe.as_bytes());
    complement(&mut dfa);
    TestResult::from_bool(accepts(&dfa, probe.as_bytes()) != before)
}

#[quickcheck]
fn trim_does_not_change_the_language(s: String, probe: String) -> TestResult {
    if !bounded(&s) || !bounded(&probe) {
        return TestResult::discard();
    }
    let mut dfa = determinize(&literal_fsm(&s), usize::MAX).unwrap();
    let before = accepts(&dfa, probe.as_bytes());
    trim(&mut dfa, TrimKind::Both);
    TestResult::from_bool(accepts(&dfa, probe.as_bytes()) == before)
}
