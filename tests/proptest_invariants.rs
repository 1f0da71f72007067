use ehtml::{extract_expressions, extract_html, lex};
use proptest::prelude::*;

proptest! {
    /// The extractor never changes the byte length of the source, for any
    /// input at all (spec §8: "extraction is always byte-length
    /// preserving").
    #[test]
    fn extraction_preserves_byte_length(src in "[a-zA-Z0-9 \n<%=>/._-]{0,120}") {
        prop_assert_eq!(extract_expressions(&src).len(), src.len());
        prop_assert_eq!(extract_html(&src).len(), src.len());
    }

    /// The lexer always terminates and always ends in exactly one EOF
    /// token, regardless of input (spec §8: "the lexer always
    /// terminates").
    #[test]
    fn lexer_always_terminates_with_a_single_trailing_eof(src in "[a-zA-Z0-9 \n<%=>/._-]{0,200}") {
        let tokens = lex(&src);
        prop_assert!(tokens.last().map(|t| t.is_eof()).unwrap_or(false));
        prop_assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
    }

    /// Concatenating every token's text reproduces the original source
    /// exactly, whenever the lexer didn't have to stall (spec §8: token
    /// values are a lossless partition of the source, barring the
    /// pathological stall case).
    #[test]
    fn tokens_concatenate_back_to_the_source_when_the_lexer_does_not_stall(src in "[a-zA-Z0-9 \n<%=>/._-]{0,200}") {
        let tokens = lex(&src);
        if !tokens.iter().any(|t| t.kind == ehtml::TokenKind::Error) {
            let rebuilt: String = tokens.iter().map(|t| t.value.as_str()).collect();
            prop_assert_eq!(rebuilt, src);
        }
    }
}
