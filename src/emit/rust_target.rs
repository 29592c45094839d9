//! Rust code emitter -- the third target alongside [`crate::emit::c`] and
//! [`crate::emit::go`], added for this crate; not present in the original
//! `libfsm`, which only ever targeted C-family languages and Go.
//!
//! Rust has no `goto`, so the op list is lowered into a `pc`-dispatching
//! loop (`loop { match pc { ... } }`) instead of labels and jumps -- the
//! standard substitute for arbitrary jumps in a language without them,
//! rather than an attempt to make the generated code look hand-written.
//! Every op still becomes exactly one match arm, preserving the same
//! one-op-at-a-time structure the C and Go emitters use. Because match arms
//! dispatch on the integer `pc` rather than named labels, `anonymous_states`
//! has nothing to rename here; it only toggles whether a state's id shows up
//! in that arm's comment.

use std::fmt::Write as _;

use crate::dfavm::{Cmp, Dest, DfaOp, EndBits, OpKind};
use crate::emit::options::{EmitOptions, Io};
use crate::fsm::EndId;
use crate::policy::AmbiguityPolicy;

/// Renders `ops` as a Rust matcher function (or just its body, in fragment
/// mode).
pub fn emit(ops: &[DfaOp], opts: &EmitOptions) -> String {
    let mut out = String::new();
    let fn_name = format!("{}{}match", opts.package_prefix, opts.prefix);

    if !opts.fragment {
        writeln!(out, "{}", signature(&fn_name, opts)).unwrap();
    }

    match opts.io {
        Io::Str => writeln!(out, "\tlet mut idx: usize = 0;").unwrap(),
        Io::Pair => writeln!(out, "\tlet mut idx: usize = start;").unwrap(),
        Io::Getc => {}
    }
    writeln!(out, "\tlet mut byte: u8 = 0;").unwrap();
    writeln!(out, "\tlet mut pc: usize = 0;").unwrap();
    writeln!(out, "\tloop {{").unwrap();
    writeln!(out, "\t\tmatch pc {{").unwrap();

    for op in ops {
        writeln!(out, "\t\t\t{} => {{{}", op.index, arm_comment(op, opts)).unwrap();

        match &op.kind {
            OpKind::Fetch { on_empty } => {
                match opts.io {
                    Io::Str => {
                        writeln!(
                            out,
                            "\t\t\t\tif idx >= data.len() {{ pc = {}; continue; }}",
                            dest_index(on_empty)
                        )
                        .unwrap();
                        writeln!(out, "\t\t\t\tbyte = data[idx];").unwrap();
                        writeln!(out, "\t\t\t\tidx += 1;").unwrap();
                    }
                    Io::Pair => {
                        writeln!(
                            out,
                            "\t\t\t\tif idx >= end {{ pc = {}; continue; }}",
                            dest_index(on_empty)
                        )
                        .unwrap();
                        writeln!(out, "\t\t\t\tbyte = data[idx];").unwrap();
                        writeln!(out, "\t\t\t\tidx += 1;").unwrap();
                    }
                    Io::Getc => {
                        writeln!(out, "\t\t\t\tmatch getc() {{").unwrap();
                        writeln!(out, "\t\t\t\t\tSome(b) => byte = b,").unwrap();
                        writeln!(
                            out,
                            "\t\t\t\t\tNone => {{ pc = {}; continue; }}",
                            dest_index(on_empty)
                        )
                        .unwrap();
                        writeln!(out, "\t\t\t\t}}").unwrap();
                    }
                }
                writeln!(out, "\t\t\t\tpc = {};", op.index + 1).unwrap();
                writeln!(out, "\t\t\t\tcontinue;").unwrap();
            }
            OpKind::Branch { cmp, arg, range, dest } => {
                if *cmp == Cmp::Always {
                    writeln!(out, "\t\t\t\tpc = {};", dest_index(dest)).unwrap();
                    writeln!(out, "\t\t\t\tcontinue;").unwrap();
                } else {
                    let cond = condition(*cmp, *arg, *range, opts);
                    writeln!(out, "\t\t\t\tif {} {{ pc = {}; continue; }}", cond, dest_index(dest)).unwrap();
                    writeln!(out, "\t\t\t\tpc = {};", op.index + 1).unwrap();
                    writeln!(out, "\t\t\t\tcontinue;").unwrap();
                }
            }
            OpKind::Stop { end_bits, end_ids } => match end_bits {
                EndBits::Fail => writeln!(out, "\t\t\t\treturn false;").unwrap(),
                EndBits::Accept => {
                    if let Some(code) = opts.leaf.render(end_ids) {
                        writeln!(out, "\t\t\t\t{}", code).unwrap();
                    } else {
                        write_accept(&mut out, end_ids, opts);
                    }
                }
            },
        }

        writeln!(out, "\t\t\t}}").unwrap();
    }

    writeln!(out, "\t\t\t_ => unreachable!(\"matcher program has no op {{}}\" ),").unwrap();
    writeln!(out, "\t\t}}").unwrap();
    writeln!(out, "\t}}").unwrap();

    if !opts.fragment {
        writeln!(out, "}}").unwrap();
    }

    out
}

fn signature(fn_name: &str, opts: &EmitOptions) -> String {
    match opts.io {
        Io::Str => format!("pub fn {}(data: &[u8]) -> bool {{", fn_name),
        Io::Getc => format!("pub fn {}(mut getc: impl FnMut() -> Option<u8>) -> bool {{", fn_name),
        Io::Pair => format!("pub fn {}(data: &[u8], start: usize, end: usize) -> bool {{", fn_name),
    }
}

fn condition(cmp: Cmp, arg: u8, range: Option<(u8, u8)>, opts: &EmitOptions) -> String {
    if opts.case_ranges {
        if let Some((lo, hi)) = range {
            if lo != hi {
                return format!("({}..={}).contains(&byte)", fmt_byte(lo, opts), fmt_byte(hi, opts));
            }
        }
    }
    format!("byte {} {}", cmp_operator(cmp), fmt_byte(arg, opts))
}

fn write_accept(out: &mut String, end_ids: &[EndId], opts: &EmitOptions) {
    if matches!(opts.ambig, AmbiguityPolicy::Error | AmbiguityPolicy::Single) && end_ids.len() > 1 {
        writeln!(out, "\t\t\t\tpanic!(\"ambiguous match: end ids {:?}\");", end_ids).unwrap();
    } else if opts.ambig == AmbiguityPolicy::Earliest && !end_ids.is_empty() {
        writeln!(out, "\t\t\t\treturn true; // end id {}", end_ids.iter().min().unwrap()).unwrap();
    } else if !end_ids.is_empty() {
        writeln!(out, "\t\t\t\treturn true; // end ids {:?}", end_ids).unwrap();
    } else {
        writeln!(out, "\t\t\t\treturn true;").unwrap();
    }
}

fn arm_comment(op: &DfaOp, opts: &EmitOptions) -> String {
    if !opts.comments {
        return String::new();
    }
    let state_prefix = if !opts.anonymous_states {
        op.origin_state.map(|s| format!("state {}, ", s)).unwrap_or_default()
    } else {
        String::new()
    };
    match &op.example {
        Some(bytes) => format!(" // {}e.g. {}", state_prefix, fmt_example(bytes, opts)),
        None if !state_prefix.is_empty() => format!(" // {}", state_prefix.trim_end_matches(", ")),
        None => String::new(),
    }
}

fn dest_index(dest: &Dest) -> usize {
    match dest {
        Dest::Op(i) => *i,
        Dest::State(_) => unreachable!("lower() resolves every Dest::State before emission"),
    }
}

fn cmp_operator(cmp: Cmp) -> &'static str {
    match cmp {
        Cmp::Lt => "<",
        Cmp::Le => "<=",
        Cmp::Eq => "==",
        Cmp::Ge => ">=",
        Cmp::Gt => ">",
        Cmp::Ne => "!=",
        Cmp::Always => "",
    }
}

fn fmt_byte(b: u8, opts: &EmitOptions) -> String {
    if !opts.always_hex && b.is_ascii_graphic() {
        format!("b'{}'", b as char)
    } else {
        format!("{:#04x}", b)
    }
}

fn fmt_example(bytes: &[u8], opts: &EmitOptions) -> String {
    if !opts.always_hex && bytes.iter().all(|&b| b.is_ascii_graphic() || b == b' ') {
        let s: String = bytes.iter().map(|&b| b as char).collect();
        format!("{:?}", s)
    } else {
        bytes.iter().map(|b| format!("{:#04x}", b)).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Label;
    use crate::determinize::determinize;
    use crate::dfavm::lower;
    use crate::fsm::Fsm;

    fn a_star() -> Fsm {
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        nfa.set_start(s);
        nfa.set_end(s, true);
        nfa.add_edge(s, Label::Byte(b'a'), s);
        nfa
    }

    #[test]
    fn emits_a_pc_dispatch_loop() {
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        let src = emit(&ops, &EmitOptions::default());
        assert!(src.contains("pub fn fsm_match"));
        assert!(src.contains("loop {"));
        assert!(src.contains("return true;"));
        assert!(src.contains("return false;"));
    }

    #[test]
    fn fragment_mode_omits_the_fn_signature() {
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        let opts = EmitOptions {
            fragment: true,
            ..EmitOptions::default()
        };
        let src = emit(&ops, &opts);
        assert!(!src.contains("pub fn"));
    }

    #[test]
    fn case_ranges_uses_an_inclusive_range_pattern() {
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
        let src = emit(&ops, &EmitOptions::default());
        assert!(src.contains("..=b'z').contains(&byte)"));
    }

    #[test]
    fn getc_io_pulls_from_a_closure() {
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        let opts = EmitOptions {
            io: Io::Getc,
            ..EmitOptions::default()
        };
        let src = emit(&ops, &opts);
        assert!(src.contains("impl FnMut() -> Option<u8>"));
        assert!(src.contains("match getc()"));
    }
}
