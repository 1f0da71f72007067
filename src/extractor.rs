//! Byte-length-preserving source projections (C9, spec §4.7).
//!
//! Each function returns a string the same byte length as the input,
//! with uninteresting regions overwritten with filler bytes (newlines
//! are always preserved so line numbers in any downstream tool stay
//! correct). Nothing is inserted or removed — only overwritten — so
//! callers can always map a byte offset in the result back to the same
//! offset in the original source.

use crate::lexer::lex;
use crate::token::TokenKind;

fn overwrite_range(bytes: &mut [u8], from: usize, to: usize, fill: impl Fn(usize) -> u8) {
    for (i, byte) in bytes.iter_mut().enumerate().take(to).skip(from) {
        if *byte != b'\n' && *byte != b'\r' {
            *byte = fill(i - from);
        }
    }
}

/// `<%#`, `<%%`, and `<%%=` open a "skip" block: comments and escaped
/// literal blocks whose content is never real expression script (spec
/// §4.7, §8: `<%% x %>` "is excluded from expression extraction").
fn is_skip_delimiter(value: &str) -> bool {
    matches!(value, "<%#" | "<%%" | "<%%=")
}

/// Keeps only the text inside `<% ... %>` blocks (the `ExpressionContent`
/// token), blanking everything else — HTML markup, the delimiters
/// themselves, and the content of skip blocks — with spaces.
pub fn extract_expressions(source: &str) -> String {
    let tokens = lex(source);
    let mut bytes = source.as_bytes().to_vec();
    let mut skipping = false;
    for tok in &tokens {
        match tok.kind {
            TokenKind::ExpressionOpen => {
                skipping = is_skip_delimiter(&tok.value);
                overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' ');
            }
            TokenKind::ExpressionContent if skipping => {
                overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' ');
            }
            TokenKind::ExpressionContent => {}
            _ => overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' '),
        }
    }
    String::from_utf8(bytes).unwrap_or_default()
}

/// Like [`extract_expressions`], except every `ExpressionEnd` token emits
/// one space, one `;`, then spaces for the rest of its length, so the
/// surviving script fragments of independent `<% %>` blocks parse as
/// separate, syntactically terminated statements (spec §4.7).
pub fn extract_expressions_with_separators(source: &str) -> String {
    let tokens = lex(source);
    let mut bytes = source.as_bytes().to_vec();
    let mut skipping = false;
    for tok in &tokens {
        match tok.kind {
            TokenKind::ExpressionOpen => {
                skipping = is_skip_delimiter(&tok.value);
                overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' ');
            }
            TokenKind::ExpressionContent if skipping => {
                overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' ');
            }
            TokenKind::ExpressionContent => {}
            TokenKind::ExpressionEnd => {
                overwrite_range(&mut bytes, tok.range.from, tok.range.to, |i| if i == 1 { b';' } else { b' ' });
            }
            _ => overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' '),
        }
    }
    String::from_utf8(bytes).unwrap_or_default()
}

/// Keeps only the HTML markup, blanking every `<% ... %>` block
/// (delimiters and content alike) with spaces.
pub fn extract_html(source: &str) -> String {
    let tokens = lex(source);
    let mut bytes = source.as_bytes().to_vec();
    for tok in &tokens {
        if matches!(
            tok.kind,
            TokenKind::ExpressionOpen | TokenKind::ExpressionContent | TokenKind::ExpressionEnd
        ) {
            overwrite_range(&mut bytes, tok.range.from, tok.range.to, |_| b' ');
        }
    }
    String::from_utf8(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_expressions_preserves_byte_length() {
        let src = "<div>\n<%= name %>\n</div>";
        let out = extract_expressions(src);
        assert_eq!(out.len(), src.len());
        assert!(out.contains(" name "));
        assert!(!out.contains("div"));
    }

    #[test]
    fn extract_html_preserves_byte_length_and_drops_script() {
        let src = "<p><%= greeting %></p>";
        let out = extract_html(src);
        assert_eq!(out.len(), src.len());
        assert!(out.contains("<p>"));
        assert!(!out.contains("greeting"));
    }

    #[test]
    fn newlines_survive_both_projections() {
        let src = "a\n<%= 1 %>\nb";
        assert_eq!(extract_expressions(src).matches('\n').count(), 2);
        assert_eq!(extract_html(src).matches('\n').count(), 2);
    }

    #[test]
    fn with_separators_marks_each_expression_end_with_a_semicolon() {
        let src = "x<%= 1 %>y<%= 2 %>z";
        let out = extract_expressions_with_separators(src);
        assert_eq!(out.len(), src.len());
        assert!(out.contains(" 1 "));
        assert!(out.contains(" 2 "));
        assert_eq!(out.matches(';').count(), 2);
    }

    #[test]
    fn skip_block_content_is_blanked_not_preserved() {
        let src = "<%% raw content %>";
        let out = extract_expressions(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("raw"));
    }
}
