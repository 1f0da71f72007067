//! Lexer (C2): a three-state machine — DATA, EXPRESSION_CONTENT,
//! EXPRESSION_CLOSE — emitting tokens in a single forward pass over the
//! source (spec §4.2).

use log::trace;

use crate::cursor::Cursor;
use crate::position::{Location, Range};
use crate::token::{Token, TokenKind};

const STALL_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    ExpressionContent,
    ExpressionClose,
}

/// Opening expression delimiters, longest first so matching is unambiguous.
const EXPR_OPEN_DELIMS: &[&str] = &["<%==", "<%%=", "<%=", "<%-", "<%#", "<%%", "<%"];

/// Closing expression delimiters, longest first.
const EXPR_CLOSE_DELIMS: &[&str] = &["%%>", "=%>", "-%>", "%>"];

/// Tokenizes `source` into a flat token stream ending in `Eof`.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    state: State,
    stall_counter: usize,
    stalled: bool,
    emitted_stall_sentinel: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source.as_bytes()),
            state: State::Data,
            stall_counter: 0,
            stalled: false,
            emitted_stall_sentinel: false,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let eof = {
                let tok = self.next_token();
                let is_eof = tok.is_eof();
                tokens.push(tok);
                is_eof
            };
            if eof {
                break;
            }
        }
        tokens
    }

    /// Produces the next token, applying the stall detector around whatever
    /// the current state's scanning routine does.
    pub fn next_token(&mut self) -> Token {
        if self.stalled {
            return self.stall_sentinel();
        }

        let before = self.cursor.position();
        let token = self.scan_one();
        self.account_for_progress(before);
        token
    }

    fn account_for_progress(&mut self, position_before: usize) {
        if self.cursor.position() == position_before && !self.cursor.at_eof() {
            self.stall_counter += 1;
            trace!("lexer stall counter = {}", self.stall_counter);
            if self.stall_counter >= STALL_LIMIT {
                self.stalled = true;
            }
        } else {
            self.stall_counter = 0;
        }
    }

    fn stall_sentinel(&mut self) -> Token {
        if self.emitted_stall_sentinel {
            self.eof_token()
        } else {
            self.emitted_stall_sentinel = true;
            let pos = self.cursor.current_position();
            let range = Range::new(self.cursor.position(), self.cursor.position());
            Token::new(TokenKind::Error, "", range, Location::new(pos, pos))
        }
    }

    fn scan_one(&mut self) -> Token {
        if self.cursor.at_eof() {
            return self.eof_token();
        }

        match self.state {
            State::Data => self.scan_data(),
            State::ExpressionContent => self.scan_expression_content(),
            State::ExpressionClose => self.scan_expression_close(),
        }
    }

    fn eof_token(&self) -> Token {
        let pos = self.cursor.current_position();
        let range = Range::new(self.cursor.position(), self.cursor.position());
        Token::new(TokenKind::Eof, "", range, Location::new(pos, pos))
    }

    fn make_token(&mut self, kind: TokenKind, byte_len: usize) -> Token {
        let start_pos = self.cursor.current_position();
        let start_byte = self.cursor.position();
        let mut value = String::new();
        for _ in 0..byte_len {
            let before = self.cursor.position();
            self.cursor.advance();
            value.push_str(
                std::str::from_utf8(&self.cursor.source()[before..self.cursor.position()])
                    .unwrap_or(""),
            );
        }
        let end_pos = self.cursor.current_position();
        let end_byte = self.cursor.position();
        Token::new(
            kind,
            value,
            Range::new(start_byte, end_byte),
            Location::new(start_pos, end_pos),
        )
    }

    /// Consumes one logical (possibly multibyte) character as a token of
    /// `kind`, advancing the cursor by exactly one character.
    fn make_char_token(&mut self, kind: TokenKind) -> Token {
        let start_pos = self.cursor.current_position();
        let start_byte = self.cursor.position();
        let before = self.cursor.position();
        self.cursor.advance();
        let value = String::from_utf8_lossy(&self.cursor.source()[before..self.cursor.position()])
            .into_owned();
        let end_pos = self.cursor.current_position();
        let end_byte = self.cursor.position();
        Token::new(
            kind,
            value,
            Range::new(start_byte, end_byte),
            Location::new(start_pos, end_pos),
        )
    }

    fn scan_data(&mut self) -> Token {
        if let Some(delim) = self.match_expression_open() {
            let tok = self.make_token(TokenKind::ExpressionOpen, delim.len());
            trace!("lexer: DATA -> EXPRESSION_CONTENT at {}", tok.location.start);
            self.state = State::ExpressionContent;
            return tok;
        }

        if self.cursor.starts_with_ci("<!DOCTYPE") {
            return self.make_token(TokenKind::HtmlDoctype, "<!DOCTYPE".len());
        }
        if self.cursor.starts_with_ci("<?xml") {
            return self.make_token(TokenKind::XmlDeclaration, "<?xml".len());
        }
        if self.cursor.starts_with(b"?>") {
            return self.make_token(TokenKind::XmlDeclarationEnd, 2);
        }
        if self.cursor.starts_with(b"<![CDATA[") {
            return self.make_token(TokenKind::CDataStart, "<![CDATA[".len());
        }
        if self.cursor.starts_with(b"]]>") {
            return self.make_token(TokenKind::CDataEnd, 3);
        }
        if self.cursor.starts_with(b"<!--") {
            return self.make_token(TokenKind::HtmlCommentStart, 4);
        }
        if self.cursor.starts_with(b"-->") {
            return self.make_token(TokenKind::HtmlCommentEnd, 3);
        }
        if self.cursor.starts_with(b"</") {
            return self.make_token(TokenKind::HtmlTagStartClose, 2);
        }
        if self.cursor.starts_with(b"/>") {
            return self.make_token(TokenKind::HtmlTagSelfClose, 2);
        }
        if self.cursor.peek(0) == Some(b'<') {
            return self.make_token(TokenKind::HtmlTagStart, 1);
        }
        if self.cursor.peek(0) == Some(b'>') {
            return self.make_token(TokenKind::HtmlTagEnd, 1);
        }

        if self.cursor.starts_with(b"\xC2\xA0") {
            return self.scan_run(TokenKind::Nbsp, 2, |cur| cur.starts_with(b"\xC2\xA0"));
        }
        if matches!(self.cursor.peek(0), Some(b'\n') | Some(b'\r')) {
            return self.scan_newline_run();
        }
        if matches!(self.cursor.peek(0), Some(b) if (b as char).is_ascii_whitespace()) {
            return self.scan_run(TokenKind::Whitespace, 1, |cur| {
                matches!(cur.peek(0), Some(b) if (b as char).is_ascii_whitespace() && b != b'\n' && b != b'\r')
            });
        }

        if let Some(len) = self.identifier_run_len() {
            return self.make_token(TokenKind::Identifier, len);
        }

        match self.cursor.peek(0) {
            Some(b'"') | Some(b'\'') => self.make_char_token(TokenKind::Quote),
            Some(b'=') => self.make_char_token(TokenKind::Equals),
            Some(b'/') => self.make_char_token(TokenKind::Slash),
            Some(b'-') => self.make_char_token(TokenKind::Dash),
            Some(b':') => self.make_char_token(TokenKind::Colon),
            Some(b';') => self.make_char_token(TokenKind::Semicolon),
            Some(b'_') => self.make_char_token(TokenKind::Underscore),
            Some(b'@') => self.make_char_token(TokenKind::At),
            Some(b'&') => self.make_char_token(TokenKind::Ampersand),
            Some(b'!') => self.make_char_token(TokenKind::Exclamation),
            Some(b'%') => self.make_char_token(TokenKind::Percent),
            Some(b'`') => self.make_char_token(TokenKind::Backtick),
            Some(b'\\') => self.make_char_token(TokenKind::Backslash),
            _ => self.make_char_token(TokenKind::Character),
        }
    }

    fn scan_expression_content(&mut self) -> Token {
        let start_pos = self.cursor.current_position();
        let start_byte = self.cursor.position();

        while !self.cursor.at_eof() && self.match_expression_close().is_none() {
            self.cursor.advance();
        }

        let end_byte = self.cursor.position();
        let end_pos = self.cursor.current_position();
        let value = String::from_utf8_lossy(&self.cursor.source()[start_byte..end_byte]).into_owned();
        self.state = State::ExpressionClose;
        Token::new(
            TokenKind::ExpressionContent,
            value,
            Range::new(start_byte, end_byte),
            Location::new(start_pos, end_pos),
        )
    }

    fn scan_expression_close(&mut self) -> Token {
        let delim = self.match_expression_close().unwrap_or("%>");
        let tok = self.make_token(TokenKind::ExpressionEnd, delim.len());
        trace!("lexer: EXPRESSION_CLOSE -> DATA at {}", tok.location.end);
        self.state = State::Data;
        tok
    }

    fn match_expression_open(&self) -> Option<&'static str> {
        EXPR_OPEN_DELIMS
            .iter()
            .find(|d| self.cursor.starts_with(d.as_bytes()))
            .copied()
    }

    fn match_expression_close(&self) -> Option<&'static str> {
        EXPR_CLOSE_DELIMS
            .iter()
            .find(|d| self.cursor.starts_with(d.as_bytes()))
            .copied()
    }

    /// Length, in bytes, of a maximal `[A-Za-z0-9_:-]+` run starting at the
    /// cursor, or `None` if the run would be a single non-alphanumeric
    /// character (in which case it is lexed as its own punctuation token
    /// instead — see DESIGN.md for the rationale).
    fn identifier_run_len(&self) -> Option<usize> {
        let is_ident_byte = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'-');
        let mut len = 0;
        while let Some(b) = self.cursor.peek(len) {
            if is_ident_byte(b) {
                len += 1;
            } else {
                break;
            }
        }
        if len == 0 {
            return None;
        }
        let first = self.cursor.peek(0).unwrap();
        if len == 1 && !first.is_ascii_alphanumeric() {
            return None;
        }
        Some(len)
    }

    fn scan_newline_run(&mut self) -> Token {
        let start_pos = self.cursor.current_position();
        let start_byte = self.cursor.position();
        loop {
            match self.cursor.peek(0) {
                Some(b'\r') | Some(b'\n') => {
                    self.cursor.advance();
                }
                _ => break,
            }
        }
        let end_byte = self.cursor.position();
        let end_pos = self.cursor.current_position();
        let value = String::from_utf8_lossy(&self.cursor.source()[start_byte..end_byte]).into_owned();
        Token::new(
            TokenKind::Newline,
            value,
            Range::new(start_byte, end_byte),
            Location::new(start_pos, end_pos),
        )
    }

    fn scan_run(
        &mut self,
        kind: TokenKind,
        first_len: usize,
        mut continues: impl FnMut(&Cursor) -> bool,
    ) -> Token {
        let start_pos = self.cursor.current_position();
        let start_byte = self.cursor.position();
        for _ in 0..first_len {
            self.cursor.advance();
        }
        while continues(&self.cursor) {
            let adv = self.cursor.advance();
            if adv.byte_len == 0 {
                break;
            }
        }
        let end_byte = self.cursor.position();
        let end_pos = self.cursor.current_position();
        let value = String::from_utf8_lossy(&self.cursor.source()[start_byte..end_byte]).into_owned();
        Token::new(
            kind,
            value,
            Range::new(start_byte, end_byte),
            Location::new(start_pos, end_pos),
        )
    }

    #[cfg(test)]
    pub(crate) fn force_stall_for_test(&mut self) -> Token {
        let before = self.cursor.position();
        self.account_for_progress(before);
        if self.stalled {
            self.stall_sentinel()
        } else {
            self.eof_token()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_lone_eof() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }

    #[test]
    fn simple_tag_round_trips_token_values() {
        let src = "<html></html>";
        let tokens = lex(src);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![
                HtmlTagStart,
                Identifier,
                HtmlTagEnd,
                HtmlTagStartClose,
                Identifier,
                HtmlTagEnd,
                Eof
            ]
        );
        let concatenated: String = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(concatenated, src);
    }

    #[test]
    fn lone_lt_at_eof_emits_punctuation_then_eof() {
        let tokens = lex("<");
        assert_eq!(tokens[0].kind, TokenKind::HtmlTagStart);
        assert!(tokens[1].is_eof());
    }

    #[test]
    fn expression_block_lexes_delimiters_and_raw_content() {
        let tokens = lex("<%= foo %>");
        use TokenKind::*;
        assert_eq!(tokens[0].kind, ExpressionOpen);
        assert_eq!(tokens[0].value, "<%=");
        assert_eq!(tokens[1].kind, ExpressionContent);
        assert_eq!(tokens[1].value, " foo ");
        assert_eq!(tokens[2].kind, ExpressionEnd);
        assert_eq!(tokens[2].value, "%>");
    }

    #[test]
    fn dash_percent_close_variant_is_longest_match() {
        let tokens = lex("<%- x -%>");
        assert_eq!(tokens[0].value, "<%-");
        assert_eq!(tokens[2].value, "-%>");
    }

    #[test]
    fn stall_detector_terminates_after_five_stalls() {
        let mut lexer = Lexer::new("abc");
        for _ in 0..STALL_LIMIT {
            lexer.force_stall_for_test();
        }
        let tok = lexer.force_stall_for_test();
        assert_eq!(tok.kind, TokenKind::Error);
        let next = lexer.force_stall_for_test();
        assert!(next.is_eof());
    }

    #[test]
    fn whitespace_and_newline_runs_coalesce_separately() {
        let tokens = lex("a \t\n\nb");
        use TokenKind::*;
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Identifier, Whitespace, Newline, Identifier, Eof]);
    }
}
