//! A demo CLI exercising each transformation in the library against a
//! literal-string machine.
//!
//! Grounded on `original_source/tests/bench/main.c`'s `enum op` (determinise
//! / complement / reverse / minimise / trim / match) and `config`/`usage()`
//! shape, narrowed down since this crate has no regex front end of its own
//! (out of scope per `SPEC_FULL.md`'s non-goals): where the original took a
//! pattern in one of several dialects, this CLI takes a literal string and
//! builds the chain machine that matches exactly it.

use clap::{Parser, Subcommand, ValueEnum};

use fsmforge::alphabet::Label;
use fsmforge::dfavm::{lower_with, LowerOptions};
use fsmforge::emit::{emit, EmitOptions, Target};
use fsmforge::{complement, complete_fsm, determinize, execute, minimize, reverse, trim, AmbiguityPolicy, Fsm, TrimKind};

/// Build and transform a finite state machine for a literal string.
#[derive(Parser)]
#[command(name = "fsmc", version, about)]
struct Cli {
    /// The literal string to build a machine for.
    literal: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the subset-construction DFA.
    Determinize,
    /// Print the minimal DFA.
    Minimize,
    /// Print the reversed-language machine.
    Reverse,
    /// Print the completed DFA (explicit trap state added).
    Complete,
    /// Print the complemented DFA.
    Complement,
    /// Print the DFA with dead states removed.
    Trim,
    /// Run the machine against an input and report whether it matched.
    Match {
        /// The input to test.
        input: String,
    },
    /// Emit a standalone matcher in the given target language.
    Emit {
        #[arg(value_enum)]
        target: EmitTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EmitTarget {
    C,
    Go,
    Rust,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let nfa = literal_fsm(&cli.literal);

    match cli.command {
        Command::Determinize => match determinize(&nfa, usize::MAX) {
            Ok(dfa) => println!("{:?}", dfa),
            Err(e) => fail(&e.to_string()),
        },
        Command::Minimize => with_dfa(&nfa, |dfa| println!("{:?}", minimize(&dfa))),
        Command::Reverse => println!("{:?}", reverse(&nfa)),
        Command::Complete => with_dfa(&nfa, |mut dfa| {
            complete_fsm(&mut dfa);
            println!("{:?}", dfa);
        }),
        Command::Complement => with_dfa(&nfa, |mut dfa| {
            complement(&mut dfa);
            println!("{:?}", dfa);
        }),
        Command::Trim => with_dfa(&nfa, |mut dfa| {
            let outcome = trim(&mut dfa, TrimKind::Both);
            log::info!("trimmed {} dead states", outcome.removed);
            println!("{:?}", dfa);
        }),
        Command::Match { input } => with_dfa(&nfa, |dfa| {
            match execute(&dfa, &mut input.bytes(), AmbiguityPolicy::None) {
                Ok(outcome) => println!("{:?}", outcome),
                Err(e) => fail(&e.to_string()),
            }
        }),
        Command::Emit { target } => with_dfa(&nfa, |dfa| {
            let min = minimize(&dfa);
            let opts = EmitOptions::default();
            let ops = lower_with(
                &min,
                &LowerOptions {
                    consolidate_edges: opts.consolidate_edges,
                },
            );
            let target = match target {
                EmitTarget::C => Target::C,
                EmitTarget::Go => Target::Go,
                EmitTarget::Rust => Target::Rust,
            };
            print!("{}", emit(target, &ops, &opts));
        }),
    }
}

fn with_dfa(nfa: &Fsm, f: impl FnOnce(Fsm)) {
    match determinize(nfa, usize::MAX) {
        Ok(dfa) => f(dfa),
        Err(e) => fail(&e.to_string()),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("fsmc: {}", message);
    std::process::exit(1);
}

/// A chain machine matching exactly the bytes of `literal`.
fn literal_fsm(literal: &str) -> Fsm {
    let mut fsm = Fsm::new();
    let mut cur = fsm.add_state();
    fsm.set_start(cur);
    for b in literal.bytes() {
        let next = fsm.add_state();
        fsm.add_edge(cur, Label::Byte(b), next);
        cur = next;
    }
    fsm.set_end(cur, true);
    fsm
}
