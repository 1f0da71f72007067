//! Token kinds and the `Token` type emitted by the lexer (C2).
//!
//! Kind names and the exact delimiter/punctuation strings are a stable
//! external contract (spec §6): callers may match on `TokenKind` and
//! compare `Token::value` against the literal delimiter strings.

use crate::position::{Location, Range};

/// All token kinds the lexer can emit. Exact set from spec §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    HtmlTagStart,
    HtmlTagStartClose,
    HtmlTagEnd,
    HtmlTagSelfClose,
    HtmlDoctype,
    XmlDeclaration,
    XmlDeclarationEnd,
    HtmlCommentStart,
    HtmlCommentEnd,
    CDataStart,
    CDataEnd,
    ExpressionOpen,
    ExpressionContent,
    ExpressionEnd,
    Identifier,
    Whitespace,
    Newline,
    Nbsp,
    Quote,
    Equals,
    Slash,
    Dash,
    Colon,
    Semicolon,
    Underscore,
    At,
    Ampersand,
    Exclamation,
    Percent,
    Backtick,
    Backslash,
    Lt,
    Character,
    Error,
    Eof,
}

/// One lexical token: a kind, its source text, and its location.
///
/// `value` is an owned substring rather than a borrow so that `Token` does
/// not need a lifetime parameter tied to the source buffer; this is one of
/// the two acceptable memory strategies named in spec §5 ("token value is
/// readable for the AST's lifetime" — copied at construction time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub range: Range,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, range: Range, location: Location) -> Self {
        Self {
            kind,
            value: value.into(),
            range,
            location,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
