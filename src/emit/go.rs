//! Go code emitter, grounded directly on
//! `original_source/src/libfsm/print/go.c`: same per-op label/comment
//! rules, same `idx++; idx >= len(data)` fetch test, same `cmp_operator`
//! mapping from [`Cmp`] to Go's comparison syntax.

use std::fmt::Write as _;

use crate::dfavm::{Cmp, Dest, DfaOp, EndBits, OpKind};
use crate::emit::options::{EmitOptions, Io};
use crate::fsm::EndId;
use crate::policy::AmbiguityPolicy;

/// Renders `ops` as a Go matcher function (or, with
/// `EmitOptions::fragment`, just the function body).
pub fn emit(ops: &[DfaOp], opts: &EmitOptions) -> String {
    let mut out = String::new();
    let labels = label_names(ops, opts);

    if !opts.fragment {
        writeln!(out, "package {}fsm", opts.package_prefix).unwrap();
        writeln!(out).unwrap();
        writeln!(out, "{}", signature(opts)).unwrap();
    }

    let any_fetch = ops.iter().any(|op| matches!(op.kind, OpKind::Fetch { .. }));
    if any_fetch {
        match opts.io {
            Io::Str => writeln!(out, "\tvar idx = ^uint(0)").unwrap(),
            Io::Pair => writeln!(out, "\tidx := start - 1").unwrap(),
            Io::Getc => writeln!(out, "\tvar b byte").unwrap(),
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
                    "\tif idx++; idx >= uint(len(data)) {{ goto {} }}",
                    labels[dest_index(on_empty)]
                )
                .unwrap(),
                Io::Pair => writeln!(
                    out,
                    "\tif idx++; idx >= uint(end) {{ goto {} }}",
                    labels[dest_index(on_empty)]
                )
                .unwrap(),
                Io::Getc => {
                    writeln!(out, "\t{{").unwrap();
                    writeln!(out, "\t\tvar ok bool").unwrap();
                    writeln!(out, "\t\tb, ok = getc()").unwrap();
                    writeln!(out, "\t\tif !ok {{ goto {} }}", labels[dest_index(on_empty)]).unwrap();
                    writeln!(out, "\t}}").unwrap();
                }
            },
            OpKind::Branch { cmp, arg, range, dest } => {
                if *cmp == Cmp::Always {
                    writeln!(out, "\tgoto {}", labels[dest_index(dest)]).unwrap();
                } else {
                    let cond = condition(*cmp, *arg, *range, opts);
                    let comment = range_comment(*range, opts);
                    writeln!(
                        out,
                        "\tif {} {{ goto {} }}{}",
                        cond,
                        labels[dest_index(dest)],
                        comment
                    )
                    .unwrap();
                }
            }
            OpKind::Stop { end_bits, end_ids } => match end_bits {
                EndBits::Fail => writeln!(out, "\treturn false").unwrap(),
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
        Io::Str => format!("func {}Match(data []byte) bool {{", opts.prefix),
        Io::Getc => format!("func {}Match(getc func() (byte, bool)) bool {{", opts.prefix),
        Io::Pair => format!("func {}Match(data []byte, start, end int) bool {{", opts.prefix),
    }
}

fn byte_expr(io: Io) -> &'static str {
    match io {
        Io::Str | Io::Pair => "data[idx]",
        Io::Getc => "b",
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
            format!(" // {}..{}", fmt_byte(lo, opts), fmt_byte(hi, opts))
        }
        _ => String::new(),
    }
}

fn write_accept(out: &mut String, end_ids: &[EndId], opts: &EmitOptions) {
    if matches!(opts.ambig, AmbiguityPolicy::Error | AmbiguityPolicy::Single) && end_ids.len() > 1 {
        writeln!(out, "\tpanic(\"ambiguous match\") // end ids {:?}", end_ids).unwrap();
    } else if opts.ambig == AmbiguityPolicy::Earliest && !end_ids.is_empty() {
        writeln!(out, "\treturn true // end id {}", end_ids.iter().min().unwrap()).unwrap();
    } else if !end_ids.is_empty() {
        writeln!(out, "\treturn true // end ids {:?}", end_ids).unwrap();
    } else {
        writeln!(out, "\treturn true").unwrap();
    }
}

/// Precomputes every op's label text up front, so a `goto` can name its
/// target the same way the target names itself regardless of visit order.
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
            writeln!(out, "{}: // e.g. {}", labels[op.index], fmt_example(bytes, opts)).unwrap()
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
