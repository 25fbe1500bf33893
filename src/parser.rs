//! Single-pass recursive-descent parser over a rune buffer, one character of
//! lookahead. Implements this grammar:
//!
//! ```text
//! re       := concat ("|" re)*
//! concat   := atom (postfix | concat)*
//! postfix  := "*" | "+" | "?"
//! atom     := "." | char | "[" class "]" | "(" ["?"] re ")"
//! class    := "^"? classItem+
//! classItem:= classChar ("-" classChar)?
//! ```
//!
//! The capturing marker is `(?`, an inverted convention from the usual PCRE
//! one: a plain `(` is a non-capturing group.

use crate::ast::AstNode;
use crate::error::{ParseError, ParseErrorKind};
use crate::range::RangeSet;

const RESERVED: &str = "\\()[]|*+-";

/// Whether `c` is printable text: a letter, mark, number, punctuation,
/// symbol, or plain space separator. Rejects control characters, format
/// characters (e.g. the zero-width space U+200B or a byte-order mark),
/// and the line/paragraph separators U+2028/U+2029, matching what most
/// Unicode-aware regex engines mean by "not a graphic character".
fn is_graphic(c: char) -> bool {
    if c.is_control() {
        return false;
    }
    if c == '\u{2028}' || c == '\u{2029}' {
        return false;
    }
    !is_format_char(c)
}

/// The Unicode "Cf" (format) general category: invisible characters that
/// affect layout or interpretation of surrounding text rather than being
/// displayed themselves.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{13438}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

pub fn parse(pattern: &str) -> Result<AstNode, ParseError> {
    let mut p = Parser::new(pattern);
    let node = p.parse_alt()?;
    match p.peek() {
        None => Ok(node),
        Some(c) => Err(p.err_here(ParseErrorKind::UnexpectedReserved(c))),
    }
}

/// Parses a pattern delimited by a repeated punctuation character, e.g.
/// `/re/`. The delimiter terminates the inner parse; trailing input after
/// the closing delimiter is an error, and `\<delim>` inside is a valid
/// escape for a literal delimiter character.
pub fn parse_bounded(pattern: &str) -> Result<AstNode, ParseError> {
    let chars: Vec<char> = pattern.chars().collect();
    if chars.len() < 2 {
        return Err(ParseError::new(0, ParseErrorKind::BoundedTooShort));
    }
    let delim = chars[0];

    let mut i = 1;
    let mut close = None;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            i += 2;
            continue;
        }
        if chars[i] == delim {
            close = Some(i);
            break;
        }
        i += 1;
    }
    let close = close.ok_or_else(|| ParseError::new(chars.len(), ParseErrorKind::UnterminatedBounded))?;
    if close + 1 != chars.len() {
        return Err(ParseError::new(close + 1, ParseErrorKind::TrailingInput));
    }

    let inner: String = chars[1..close].iter().collect();
    let mut p = Parser::with_extra_escape(&inner, delim);
    let node = p.parse_alt()?;
    match p.peek() {
        None => Ok(node),
        Some(c) => Err(p.err_here(ParseErrorKind::UnexpectedReserved(c))),
    }
}

struct Parser {
    buf: Vec<char>,
    pos: usize,
    cap_counter: usize,
    active_caps: Vec<usize>,
    extra_escape: Option<char>,
}

impl Parser {
    fn new(pattern: &str) -> Self {
        Parser {
            buf: pattern.chars().collect(),
            pos: 0,
            cap_counter: 0,
            active_caps: Vec::new(),
            extra_escape: None,
        }
    }

    fn with_extra_escape(pattern: &str, delim: char) -> Self {
        let mut p = Parser::new(pattern);
        p.extra_escape = Some(delim);
        p
    }

    fn peek(&self) -> Option<char> {
        self.buf.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn err_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, kind)
    }

    fn expect(&mut self, c: char, on_missing: ParseErrorKind) -> Result<(), ParseError> {
        if self.peek() == Some(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.err_here(on_missing))
        }
    }

    // re := concat ("|" re)*    -- right-associative
    fn parse_alt(&mut self) -> Result<AstNode, ParseError> {
        let left = self.parse_concat()?;
        if self.peek() == Some('|') {
            self.advance();
            let right = self.parse_alt()?;
            Ok(AstNode::alt(left, right))
        } else {
            Ok(left)
        }
    }

    // The bounded-form entry point strips the delimiter before parsing ever
    // starts, so by the time the parser runs the only terminators it needs
    // to recognize are alternation and group close.
    fn is_terminator(&self, c: char) -> bool {
        c == '|' || c == ')'
    }

    // concat := atom (postfix | concat)*
    fn parse_concat(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_atom()?;
        loop {
            match self.peek() {
                None => break,
                Some(c) if self.is_terminator(c) => break,
                Some('*') => {
                    self.advance();
                    left = AstNode::Star(Box::new(left));
                }
                Some('+') => {
                    self.advance();
                    left = AstNode::Plus(Box::new(left));
                }
                Some('?') => {
                    self.advance();
                    left = AstNode::Opt(Box::new(left));
                }
                Some(_) => {
                    let right = self.parse_concat()?;
                    left = AstNode::concat(left, right);
                }
            }
        }
        Ok(left)
    }

    // atom := "." | char | "[" class "]" | "(" ["?"] re ")"
    fn parse_atom(&mut self) -> Result<AstNode, ParseError> {
        match self.peek() {
            None => Err(self.err_here(ParseErrorKind::UnexpectedEof)),
            Some('.') => {
                self.advance();
                Ok(AstNode::Class(RangeSet::full(), self.active_caps.clone()))
            }
            Some('[') => self.parse_class(),
            Some('(') => self.parse_group(),
            Some(')') => Err(self.err_here(ParseErrorKind::UnexpectedReserved(')'))),
            Some('|') => Err(self.err_here(ParseErrorKind::UnexpectedReserved('|'))),
            Some('*') | Some('+') | Some('?') => {
                let c = self.peek().unwrap();
                Err(self.err_here(ParseErrorKind::UnexpectedReserved(c)))
            }
            Some(']') => Err(self.err_here(ParseErrorKind::UnmatchedClassClose)),
            Some(_) => {
                let c = self.parse_re_char()?;
                Ok(AstNode::Class(RangeSet::single(c), self.active_caps.clone()))
            }
        }
    }

    fn parse_group(&mut self) -> Result<AstNode, ParseError> {
        self.advance(); // consume '('
        let capturing = self.peek() == Some('?');
        if capturing {
            self.advance();
            self.cap_counter += 1;
            self.active_caps.push(self.cap_counter);
        }
        let inner = self.parse_alt()?;
        self.expect(')', ParseErrorKind::UnterminatedGroup)?;
        if capturing {
            self.active_caps.pop();
        }
        Ok(inner)
    }

    fn parse_class(&mut self) -> Result<AstNode, ParseError> {
        self.advance(); // consume '['
        let invert = self.peek() == Some('^');
        if invert {
            self.advance();
        }
        let mut rs = RangeSet::new();
        loop {
            match self.peek() {
                None => return Err(self.err_here(ParseErrorKind::UnterminatedClass)),
                Some(']') => break,
                _ => {
                    let lo = self.parse_class_char()?;
                    if self.peek() == Some('-') {
                        self.advance();
                        if self.peek() == Some(']') {
                            return Err(self.err_here(ParseErrorKind::StrayDash));
                        }
                        let hi = self.parse_class_char()?;
                        if (hi as u32) < (lo as u32) {
                            return Err(self.err_here(ParseErrorKind::EmptyClassRange));
                        }
                        rs.add(lo as u32, hi as u32);
                    } else {
                        rs.add(lo as u32, lo as u32);
                    }
                }
            }
        }
        self.advance(); // consume ']'
        if invert {
            rs = rs.invert();
        }
        Ok(AstNode::Class(rs, self.active_caps.clone()))
    }

    fn parse_class_char(&mut self) -> Result<char, ParseError> {
        match self.peek() {
            None => Err(self.err_here(ParseErrorKind::UnterminatedClass)),
            Some('-') => Err(self.err_here(ParseErrorKind::StrayDash)),
            Some(']') => Err(self.err_here(ParseErrorKind::UnmatchedClassClose)),
            Some('\\') => self.parse_escaped(),
            Some(c) if RESERVED.contains(c) => Err(self.err_here(ParseErrorKind::UnexpectedReserved(c))),
            Some(c) if !is_graphic(c) => Err(self.err_here(ParseErrorKind::NonGraphicChar)),
            Some(c) => {
                self.advance();
                Ok(c)
            }
        }
    }

    fn parse_re_char(&mut self) -> Result<char, ParseError> {
        match self.peek() {
            None => Err(self.err_here(ParseErrorKind::UnexpectedEof)),
            Some('\\') => self.parse_escaped(),
            Some(c) if RESERVED.contains(c) => Err(self.err_here(ParseErrorKind::UnexpectedReserved(c))),
            Some(c) if !is_graphic(c) => Err(self.err_here(ParseErrorKind::NonGraphicChar)),
            Some(c) => {
                self.advance();
                Ok(c)
            }
        }
    }

    fn parse_escaped(&mut self) -> Result<char, ParseError> {
        self.advance(); // consume '\\'
        match self.peek() {
            None => Err(self.err_here(ParseErrorKind::UnexpectedEof)),
            Some(c) if RESERVED.contains(c) => {
                self.advance();
                Ok(c)
            }
            Some('n') => {
                self.advance();
                Ok('\n')
            }
            Some('r') => {
                self.advance();
                Ok('\r')
            }
            Some(c) if Some(c) == self.extra_escape => {
                self.advance();
                Ok(c)
            }
            Some(c) => Err(self.err_here(ParseErrorKind::UnsupportedEscape(c))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    #[test]
    fn parses_literal_concat() {
        let ast = parse("hello").unwrap();
        assert_matches!(ast, AstNode::Concat(_, _));
    }

    #[test]
    fn parses_alternation_right_associative() {
        let ast = parse("a|b|c").unwrap();
        match ast {
            AstNode::Alt(left, right) => {
                assert_matches!(*left, AstNode::Class(_, _));
                assert_matches!(*right, AstNode::Alt(_, _));
            }
            other => panic!("expected Alt, got {:?}", other),
        }
    }

    #[test]
    fn stacked_star_nests() {
        let ast = parse("a**").unwrap();
        assert_matches!(ast, AstNode::Star(_));
        if let AstNode::Star(inner) = ast {
            assert_matches!(*inner, AstNode::Star(_));
        }
    }

    #[test]
    fn capturing_marker_is_question_after_paren() {
        let ast = parse("(?a)").unwrap();
        match ast {
            AstNode::Class(_, caps) => assert_eq!(caps, vec![1]),
            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn non_capturing_group_has_no_active_caps() {
        let ast = parse("(a)").unwrap();
        match ast {
            AstNode::Class(_, caps) => assert!(caps.is_empty()),
            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn negated_class_inverts() {
        let ast = parse("[^a-z]").unwrap();
        match ast {
            AstNode::Class(rs, _) => {
                assert!(rs.contains('X' as u32));
                assert!(!rs.contains('x' as u32));
            }
            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn empty_class_range_is_error() {
        let err = parse("[z-a]").unwrap_err();
        assert_matches!(err.kind, ParseErrorKind::EmptyClassRange);
    }

    #[test]
    fn unterminated_group_is_error() {
        let err = parse("(a").unwrap_err();
        assert_matches!(err.kind, ParseErrorKind::UnterminatedGroup);
    }

    #[test]
    fn unterminated_class_is_error() {
        let err = parse("[a").unwrap_err();
        assert_matches!(err.kind, ParseErrorKind::UnterminatedClass);
    }

    #[test]
    fn unsupported_escape_is_error() {
        let err = parse("\\q").unwrap_err();
        assert_matches!(err.kind, ParseErrorKind::UnsupportedEscape('q'));
    }

    #[test]
    fn zero_width_space_literal_is_non_graphic() {
        let err = parse("a\u{200b}b").unwrap_err();
        assert_matches!(err.kind, ParseErrorKind::NonGraphicChar);
    }

    #[test]
    fn line_separator_in_class_is_non_graphic() {
        let err = parse("[a\u{2028}z]").unwrap_err();
        assert_matches!(err.kind, ParseErrorKind::NonGraphicChar);
    }

    #[test]
    fn ordinary_unicode_letters_and_space_are_graphic() {
        assert!(parse("café na\u{00EF}ve").is_ok());
        assert!(parse("\u{0301}").is_ok());
    }

    #[test]
    fn bounded_form_parses_and_rejects_trailing() {
        assert!(parse_bounded("/a*/").is_ok());
        assert!(parse_bounded("/foo/ ").is_err());
        assert!(parse_bounded("/foo").is_err());
        assert!(parse_bounded("#/foo/bar/baz#").is_ok());
        assert!(parse_bounded("/\\/foo\\/bar\\/baz/").is_ok());
        assert!(parse_bounded("/foo/bar/baz/").is_err());
    }
}
