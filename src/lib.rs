//! A small regular-expression engine with two matcher backends: an NFA
//! executed via simultaneous-state simulation, and a DFA built from the NFA
//! by subset construction.
//!
//! The public surface is four entry points ([`parse`], [`parse_bounded`],
//! [`new_nfa_matcher`], [`new_dfa_matcher`]), plus the [`Matcher`] trait
//! both backends implement. Everything else (the character-range algebra,
//! the parser's AST, the NFA/DFA graphs) is exposed for composition and
//! testing but is not itself the intended integration surface.

pub mod ast;
pub mod dfa;
pub mod error;
pub mod matcher;
pub mod nfa;
pub mod parser;
pub mod range;

pub use ast::AstNode;
pub use error::{ParseError, ParseErrorKind};
pub use matcher::{new_dfa_matcher, new_nfa_matcher, parse, parse_bounded, DfaMatcher, Matcher, NfaMatcher};
pub use range::{Range, RangeSet};
