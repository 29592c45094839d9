//! Running a deterministic `Fsm` against an input, and reporting which
//! end ids (if any) the final state carries.
//!
//! `ByteSource` replaces the C original's `enum fsm_io` dispatch over a
//! `FSM_IO_GETC` function pointer, `FSM_IO_STR` buffer, or `FSM_IO_PAIR`
//! pointer range (see `original_source/include/fsm/options.h`) with a
//! single trait: any caller that can hand back one byte at a time, however
//! it's actually stored, can drive execution the same way.

use log::trace;

use crate::error::{FsmError, Result};
use crate::fsm::{EndId, Fsm};
use crate::policy::AmbiguityPolicy;
use crate::alphabet::Label;

/// A source of input bytes, consumed one at a time.
///
/// Blanket-implemented for any `Iterator<Item = u8>`, so a `&[u8]`'s
/// `.iter().copied()`, a `std::io::Bytes` adapter, or a hand-written
/// generator all work without a wrapper type.
pub trait ByteSource {
    /// Returns the next byte, or `None` at end of input.
    fn next_byte(&mut self) -> Option<u8>;
}

impl<I: Iterator<Item = u8>> ByteSource for I {
    fn next_byte(&mut self) -> Option<u8> {
        self.next()
    }
}

/// The result of running a machine to completion against an input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Whether the final state was accepting.
    pub matched: bool,
    /// The end ids reported for the final state, filtered by the
    /// [`AmbiguityPolicy`] in effect. Empty when `matched` is `false`.
    pub end_ids: Vec<EndId>,
}

/// Consumes every byte `source` produces and reports the resulting match.
///
/// `fsm` must be deterministic and, for a meaningful "no match" result
/// rather than a premature stop, complete -- an incomplete machine with a
/// missing transition reports a non-match the moment that transition would
/// be taken, which is usually what's wanted but is the caller's call to
/// make (run [`crate::complete::complete`] first if not).
///
/// Fails with [`FsmError::AmbiguousEndIds`] if the final state carries more
/// than one live end id and `policy` is [`AmbiguityPolicy::Error`] or
/// [`AmbiguityPolicy::Single`].
pub fn execute<S: ByteSource>(
    fsm: &Fsm,
    source: &mut S,
    policy: AmbiguityPolicy,
) -> Result<MatchOutcome> {
    assert!(fsm.is_deterministic(), "execute requires a deterministic Fsm");

    let mut cur = match fsm.get_start() {
        Some(s) => s,
        None => return Ok(no_match()),
    };

    let mut consumed = 0usize;
    while let Some(b) = source.next_byte() {
        consumed += 1;
        match fsm.edges(cur, Label::Byte(b)).next() {
            Some(next) => cur = next,
            None => {
                trace!("execute: no transition on byte {:#04x} after {} bytes, rejecting", b, consumed);
                return Ok(no_match());
            }
        }
    }

    if !fsm.is_end(cur) {
        trace!("execute: consumed {} bytes, final state {} is not accepting", consumed, cur);
        return Ok(no_match());
    }

    let ids: Vec<EndId> = fsm.end_ids(cur).iter().copied().collect();
    let reported = apply_policy(&ids, policy)?;
    trace!("execute: accepted after {} bytes with end ids {:?}", consumed, reported);
    Ok(MatchOutcome {
        matched: true,
        end_ids: reported,
    })
}

fn apply_policy(ids: &[EndId], policy: AmbiguityPolicy) -> Result<Vec<EndId>> {
    match policy {
        AmbiguityPolicy::None | AmbiguityPolicy::Multiple => Ok(ids.to_vec()),
        AmbiguityPolicy::Earliest => Ok(ids.iter().take(1).copied().collect()),
        AmbiguityPolicy::Error | AmbiguityPolicy::Single => {
            if ids.len() > 1 {
                Err(FsmError::AmbiguousEndIds {
                    end_ids: ids.to_vec(),
                })
            } else {
                Ok(ids.to_vec())
            }
        }
    }
}

fn no_match() -> MatchOutcome {
    MatchOutcome {
        matched: false,
        end_ids: Vec::new(),
    }
}
