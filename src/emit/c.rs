//! C code emitter, the sibling of [`crate::emit::go`] for the other target
//! the original `libfsm` shipped first. Same op-to-source mapping, with
//! C's comma operator standing in for Go's `if init; cond` form and an
//! explicit function prototype instead of a package clause.

use std::fmt::Write as _;

use crate::dfavm::{Cmp, Dest, DfaOp, EndBits, OpKind};
use crate::emit::options::{EmitOptions, Io};
use crate::fsm::EndId;
use crate::policy::AmbiguityPolicy;

/// Renders `ops` as a C matcher function (or just its body, in fragment
/// mode).
pub fn emit(ops: &[DfaOp], opts: &EmitOptions) -> String {
    let mut out = String::new();
    let labels = label_names(ops, opts);

    if !opts.fragment {
        writeln!(out, "#include <stddef.h>").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "{}", signature(opts)).unwrap();
    }

    let any_fetch = ops.iter().any(|op| matches!(op.kind, OpKind::Fetch { .. }));
    if any_fetch {
        match opts.io {
            Io::Str => writeln!(out, "\tsize_t idx = (size_t)-1;").unwrap(),
            Io::Pair => writeln!(out, "\tsize_t idx = start - 1;").unwrap(),
            Io::Getc => writeln!(out, "\tint c;").unwrap(),
        }
    }

    for op in ops {
        if op.num_incoming > 0 {
            print_label(&mut out, op, &labels, opts);
        }
        match &op.kind {
            OpKind::Fetch { on_empty } => match opts.io {
                Io::Str => writeln!(
                    out,
                    "\tif (++idx >= len) {{ goto {}; }}",
                    labels[dest_index(on_empty)]
                )
                .unwrap(),
                Io::Pair => writeln!(
                    out,
                    "\tif (++idx >= end) {{ goto {}; }}",
                    labels[dest_index(on_empty)]
                )
                .unwrap(),
                Io::Getc => {
                    writeln!(out, "\tc = getc(ctx);").unwrap();
                    writeln!(out, "\tif (c < 0) {{ goto {}; }}", labels[dest_index(on_empty)]).unwrap();
                }
            },
            OpKind::Branch { cmp, arg, range, dest } => {
                if *cmp == Cmp::Always {
                    writeln!(out, "\tgoto {};", labels[dest_index(dest)]).unwrap();
                } else {
                    let cond = condition(*cmp, *arg, *range, opts);
                    let comment = range_comment(*range, opts);
                    writeln!(out, "\tif ({}) {{ goto {}; }}{}", cond, labels[dest_index(dest)], comment).unwrap();
                }
            }
            OpKind::Stop { end_bits, end_ids } => match end_bits {
                EndBits::Fail => writeln!(out, "\treturn 0;").unwrap(),
                EndBits::Accept => {
                    if let Some(code) = opts.leaf.render(end_ids) {
                        writeln!(out, "\t{}", code).unwrap();
                    } else {
                        write_accept(&mut out, end_ids, opts);
                    }
                }
            },
        }
    }

    if !opts.fragment {
        writeln!(out, "}}").unwrap();
    }

    out
}

fn signature(opts: &EmitOptions) -> String {
    match opts.io {
        Io::Str => format!(
            "int {}{}match(const char *data, size_t len) {{",
            opts.package_prefix, opts.prefix
        ),
        Io::Getc => format!(
            "int {}{}match(int (*getc)(void *ctx), void *ctx) {{",
            opts.package_prefix, opts.prefix
        ),
        Io::Pair => format!(
            "int {}{}match(const char *data, size_t start, size_t end) {{",
            opts.package_prefix, opts.prefix
        ),
    }
}

fn byte_expr(io: Io) -> &'static str {
    match io {
        Io::Str | Io::Pair => "data[idx]",
        Io::Getc => "(unsigned char)c",
    }
}

fn condition(cmp: Cmp, arg: u8, range: Option<(u8, u8)>, opts: &EmitOptions) -> String {
    let byte = byte_expr(opts.io);
    if opts.case_ranges {
        if let Some((lo, hi)) = range {
            if lo != hi {
                return format!(
                    "{} <= {} && {} <= {}",
                    fmt_byte(lo, opts),
                    byte,
                    byte,
                    fmt_byte(hi, opts)
                );
            }
        }
    }
    format!("{} {} {}", byte, cmp_operator(cmp), fmt_byte(arg, opts))
}

fn range_comment(range: Option<(u8, u8)>, opts: &EmitOptions) -> String {
    match range {
        Some((lo, hi)) if opts.comments && opts.group_edges && lo != hi => {
            format!(" /* {}..{} */", fmt_byte(lo, opts), fmt_byte(hi, opts))
        }
        _ => String::new(),
    }
}

fn write_accept(out: &mut String, end_ids: &[EndId], opts: &EmitOptions) {
    if matches!(opts.ambig, AmbiguityPolicy::Error | AmbiguityPolicy::Single) && end_ids.len() > 1 {
        writeln!(out, "\treturn -1; /* ambiguous: end ids {:?} */", end_ids).unwrap();
    } else if opts.ambig == AmbiguityPolicy::Earliest && !end_ids.is_empty() {
        writeln!(out, "\treturn 1; /* end id {} */", end_ids.iter().min().unwrap()).unwrap();
    } else if !end_ids.is_empty() {
        writeln!(out, "\treturn 1; /* end ids {:?} */", end_ids).unwrap();
    } else {
        writeln!(out, "\treturn 1;").unwrap();
    }
}

fn label_names(ops: &[DfaOp], opts: &EmitOptions) -> Vec<String> {
    ops.iter()
        .map(|op| {
            if !opts.anonymous_states {
                if let Some(s) = op.origin_state {
                    return format!("state{}_{}", s, op.index);
                }
            }
            format!("l{}", op.index)
        })
        .collect()
}

fn print_label(out: &mut String, op: &DfaOp, labels: &[String], opts: &EmitOptions) {
    match (opts.comments, &op.example) {
        (true, Some(bytes)) => {
            writeln!(out, "{}: /* e.g. {} */", labels[op.index], fmt_example(bytes, opts)).unwrap()
        }
        _ => writeln!(out, "{}:", labels[op.index]).unwrap(),
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
        format!("'{}'", b as char)
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
    use crate::determinize::determinize;
    use crate::dfavm::lower;
    use crate::fsm::Fsm;
    use crate::alphabet::Label;

    fn a_star() -> Fsm {
        let mut nfa = Fsm::new();
        let s = nfa.add_state();
        nfa.set_start(s);
        nfa.set_end(s, true);
        nfa.add_edge(s, Label::Byte(b'a'), s);
        nfa
    }

    #[test]
    fn emits_a_complete_c_function() {
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        let src = emit(&ops, &EmitOptions::default());
        assert!(src.contains("int fsm_match"));
        assert!(src.contains("return 1;"));
        assert!(src.contains("return 0;"));
    }

    #[test]
    fn first_fetch_reads_byte_zero_without_skipping_it() {
        // Regression coverage for the off-by-one in the old `pos == 0`
        // special case: the entry fetch must not pre-increment past
        // `data[0]`, and every subsequent fetch must use the same `++idx`
        // form unconditionally, including on a loop back to op 0.
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        let src = emit(&ops, &EmitOptions::default());
        // Every fetch in this program, including the entry one, increments
        // first -- there is no bare `idx >= len` check left anywhere.
        assert!(!src.contains("if (idx >= len)"));
        assert!(src.contains("if (++idx >= len)"));
    }

    #[test]
    fn pair_io_checks_against_the_supplied_bound() {
        let dfa = determinize(&a_star(), usize::MAX).unwrap();
        let ops = lower(&dfa);
        let opts = EmitOptions {
            io: Io::Pair,
            ..EmitOptions::default()
        };
        let src = emit(&ops, &opts);
        assert!(src.contains("size_t start, size_t end"));
        assert!(src.contains("idx >= end"));
    }
}
