//! Emitter configuration, mirroring `struct fsm_options` in
//! `original_source/include/fsm/options.h` field-for-field, with the C
//! bitfields rendered as plain `bool`s and the two C enums (`fsm_io`,
//! `fsm_ambig`) given Rust homes of their own.

use std::fmt;
use std::rc::Rc;

use crate::fsm::EndId;
use crate::policy::AmbiguityPolicy;

/// How the generated matcher receives its input.
///
/// Corresponds to `enum fsm_io`. This crate's own [`crate::exec::execute`]
/// always behaves like `Str` (the whole input is available up front); this
/// enum controls what calling convention the *emitted* source code uses
/// instead, since a generated C, Go, or Rust matcher may be embedded in a
/// caller that streams bytes one at a time rather than handing over a
/// complete buffer. It drives both the emitted function's signature and how
/// each `Fetch` op reads its next byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Io {
    /// Pull one byte at a time from a caller-supplied getter.
    Getc,
    /// The whole input is a single contiguous byte string.
    #[default]
    Str,
    /// The input is a byte string plus a `(start, end)` bound within it.
    Pair,
}

/// Renders the body of an accepting `Stop` that carries `end_ids`, in
/// whatever syntax the calling emitter targets.
///
/// Corresponds to the `leaf` callback hook in the original `fsm_options`:
/// a caller that wants custom code at a match (writing the matched end id
/// somewhere, invoking a user callback, whatever) supplies one of these
/// instead of accepting the emitter's own `ambig`-driven default. Returning
/// `None` falls back to that default.
pub trait Leaf {
    fn render(&self, end_ids: &[EndId]) -> Option<String>;
}

/// The default leaf: defers entirely to [`EmitOptions::ambig`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLeaf;

impl Leaf for DefaultLeaf {
    fn render(&self, _end_ids: &[EndId]) -> Option<String> {
        None
    }
}

/// Options controlling how an emitter renders a matcher program as source.
#[derive(Clone)]
pub struct EmitOptions {
    /// Don't bother giving states human-meaningful names; number labels
    /// anonymously (`l7`) rather than naming them after their origin state
    /// (`state3_7`).
    pub anonymous_states: bool,
    /// Fuse contiguous byte ranges into a single comparison rather than
    /// emitting one comparison per byte. Passed through to
    /// [`crate::dfavm::LowerOptions`] before lowering.
    pub consolidate_edges: bool,
    /// Emit only the matcher body, not a complete compilable unit (no
    /// `package`/`#include` wrapper).
    pub fragment: bool,
    /// Emit `// e.g. "..."` example-byte comments on labelled ops.
    pub comments: bool,
    /// Render a fused byte range as one bounds check (`lo <= b && b <= hi`,
    /// or Rust's `(lo..=hi).contains(&b)`) rather than the single-sided
    /// comparison its skip-guard pair would otherwise rely on.
    pub case_ranges: bool,
    /// Always render byte literals in hex, even printable ASCII ones.
    pub always_hex: bool,
    /// Annotate a fused range's match branch with a trailing comment
    /// showing the whole `lo..hi` span it covers, instead of leaving it
    /// implicit in the comparison.
    pub group_edges: bool,
    /// Input calling convention for the emitted source.
    pub io: Io,
    /// How the emitted matcher should behave when more than one end id is
    /// live at a stop.
    pub ambig: AmbiguityPolicy,
    /// Prefix prepended to generated identifiers (function/type names).
    /// Defaults to `"fsm_"`, matching the C original.
    pub prefix: String,
    /// Prefix prepended to the emitted package/module/namespace name.
    pub package_prefix: String,
    /// Caller-supplied hook for an accepting stop's body; see [`Leaf`].
    pub leaf: Rc<dyn Leaf>,
}

impl fmt::Debug for EmitOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EmitOptions")
            .field("anonymous_states", &self.anonymous_states)
            .field("consolidate_edges", &self.consolidate_edges)
            .field("fragment", &self.fragment)
            .field("comments", &self.comments)
            .field("case_ranges", &self.case_ranges)
            .field("always_hex", &self.always_hex)
            .field("group_edges", &self.group_edges)
            .field("io", &self.io)
            .field("ambig", &self.ambig)
            .field("prefix", &self.prefix)
            .field("package_prefix", &self.package_prefix)
            .field("leaf", &"<leaf hook>")
            .finish()
    }
}

impl Default for EmitOptions {
    fn default() -> EmitOptions {
        EmitOptions {
            anonymous_states: false,
            consolidate_edges: true,
            fragment: false,
            comments: true,
            case_ranges: true,
            always_hex: false,
            group_edges: true,
            io: Io::Str,
            ambig: AmbiguityPolicy::None,
            prefix: "fsm_".to_string(),
            package_prefix: String::new(),
            leaf: Rc::new(DefaultLeaf),
        }
    }
}
