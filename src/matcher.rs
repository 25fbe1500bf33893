//! The public façade: four entry points that compile pattern text down to
//! a matcher value, plus the `Matcher` trait both backends implement.

use crate::ast::AstNode;
use crate::dfa::{self, Dfa};
use crate::error::ParseError;
use crate::nfa::{self, Nfa};
use crate::parser;

/// A compiled pattern that accepts whole input strings. `captures` returns
/// both the match outcome and any capture groups (empty for the DFA
/// backend, which does not track them).
pub trait Matcher {
    fn is_match(&self, input: &str) -> bool {
        self.captures(input).1
    }

    /// Returns `(groups, ok)`: `ok` is true iff the entire input is
    /// accepted, and `groups` holds the captured substring for each group
    /// id `1..=max_group_seen` (empty for an id that was never filled, or
    /// for any result from the DFA backend).
    fn captures(&self, input: &str) -> (Vec<String>, bool);
}

/// Parses `pattern` into its abstract syntax tree.
pub fn parse(pattern: &str) -> Result<AstNode, ParseError> {
    parser::parse(pattern)
}

/// Parses a delimiter-bounded pattern such as `/re/`.
pub fn parse_bounded(pattern: &str) -> Result<AstNode, ParseError> {
    parser::parse_bounded(pattern)
}

/// A matcher backed by simultaneous-state NFA simulation. Supports capture
/// groups.
pub struct NfaMatcher {
    nfa: Nfa,
}

impl NfaMatcher {
    fn from_ast(ast: &AstNode) -> Self {
        NfaMatcher { nfa: nfa::build(ast) }
    }
}

impl Matcher for NfaMatcher {
    fn captures(&self, input: &str) -> (Vec<String>, bool) {
        let m = nfa::run(&self.nfa, input);
        (m.groups, m.matched)
    }
}

/// A matcher backed by a DFA built from the NFA via subset construction.
/// Faster per-character matching, at the cost of not tracking captures and
/// a worst-case exponential blowup in state count at construction time.
pub struct DfaMatcher {
    dfa: Dfa,
}

impl DfaMatcher {
    fn from_ast(ast: &AstNode) -> Self {
        let nfa = nfa::build(ast);
        DfaMatcher { dfa: dfa::build(&nfa) }
    }
}

impl Matcher for DfaMatcher {
    fn captures(&self, input: &str) -> (Vec<String>, bool) {
        (Vec::new(), dfa::run(&self.dfa, input))
    }
}

/// Parses `pattern` and builds an NFA-backed matcher.
pub fn new_nfa_matcher(pattern: &str) -> Result<NfaMatcher, ParseError> {
    let ast = parser::parse(pattern)?;
    Ok(NfaMatcher::from_ast(&ast))
}

/// Parses `pattern` and builds a DFA-backed matcher.
pub fn new_dfa_matcher(pattern: &str) -> Result<DfaMatcher, ParseError> {
    let ast = parser::parse(pattern)?;
    Ok(DfaMatcher::from_ast(&ast))
}
