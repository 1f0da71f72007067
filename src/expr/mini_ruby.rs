//! A minimal, self-contained stand-in for a real expression-language
//! parser, recognizing just enough keyword shape to exercise the
//! documented interface in spec §6. See `SPEC_FULL.md` §1.1 and
//! DESIGN.md for why this exists and its known limitations (it cannot,
//! for instance, tell `case/when` from `case/in` from the opening `case`
//! fragment alone the way a real Ruby parser can).

use regex::Regex;

use super::{ExprDiagnostic, ExprDiagnosticLevel, ExprNode, ExprNodeKind, ExprOptions, ExprParseResult, ExpressionParser};

/// Keywords that can only ever appear as a continuation of an
/// already-open control structure; standing alone they are always a
/// syntax error, and the exact diagnostic message is part of the
/// documented external contract (spec §6).
const CLOSER_KEYWORDS: &[(&str, ExprNodeKind, &str)] = &[
    ("elsif", ExprNodeKind::Elsif, "unexpected 'elsif', ignoring it"),
    ("else", ExprNodeKind::Else, "unexpected 'else', ignoring it"),
    ("end", ExprNodeKind::End, "unexpected 'end', ignoring it"),
    ("when", ExprNodeKind::When, "unexpected 'when', ignoring it"),
    ("in", ExprNodeKind::In, "unexpected 'in', ignoring it"),
    ("rescue", ExprNodeKind::Rescue, "unexpected 'rescue', ignoring it"),
    ("ensure", ExprNodeKind::Ensure, "unexpected 'ensure', ignoring it"),
];

const OPENER_KEYWORDS: &[(&str, ExprNodeKind)] = &[
    ("if", ExprNodeKind::If),
    ("unless", ExprNodeKind::Unless),
    ("case", ExprNodeKind::Case),
    ("begin", ExprNodeKind::Begin),
    ("while", ExprNodeKind::While),
    ("until", ExprNodeKind::Until),
    ("for", ExprNodeKind::For),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MiniRubyParser;

impl MiniRubyParser {
    pub fn new() -> Self {
        Self
    }

    fn leading_word(text: &str) -> Option<(&str, usize)> {
        let start = text.find(|c: char| !c.is_whitespace())?;
        let rest = &text[start..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end == 0 {
            None
        } else {
            Some((&rest[..end], start))
        }
    }

    /// Word-boundary-safe substring search, e.g. so `"end"` doesn't match
    /// inside `"sender"`. Built with `regex` rather than hand-rolled byte
    /// scanning, matching how the rest of this codebase's pack reaches
    /// for the crate whenever a pattern search is word-aware.
    fn contains_word(text: &str, word: &str) -> bool {
        Regex::new(&format!(r"\b{}\b", regex::escape(word)))
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    }

    fn ends_with_block_opener(trimmed: &str) -> bool {
        let without_params = match trimmed.rfind('|') {
            Some(last_pipe) => {
                if let Some(first_pipe) = trimmed[..last_pipe].rfind('|') {
                    trimmed[..first_pipe].trim_end()
                } else {
                    trimmed
                }
            }
            None => trimmed,
        };
        without_params.ends_with("do") || without_params.trim_end().ends_with('{')
    }
}

impl ExpressionParser for MiniRubyParser {
    fn parse(&self, source: &str, _options: ExprOptions) -> ExprParseResult {
        let trimmed = source.trim();

        if trimmed.is_empty() {
            return ExprParseResult {
                valid: true,
                root: ExprNode::leaf(ExprNodeKind::Other),
                diagnostics: Vec::new(),
            };
        }

        let has_yield = Self::contains_word(trimmed, "yield");
        let yield_child = || vec![ExprNode::leaf(ExprNodeKind::Yield)];

        if trimmed == "}" {
            return ExprParseResult {
                valid: false,
                root: ExprNode::with_children(ExprNodeKind::BlockClose, if has_yield { yield_child() } else { vec![] }),
                diagnostics: vec![ExprDiagnostic {
                    message: "unexpected '}', ignoring it".to_string(),
                    location_start_byte: 0,
                    location_end_byte: source.len(),
                    level: ExprDiagnosticLevel::Error,
                }],
            };
        }

        let trim_prefix = source.len() - source.trim_start().len();

        if let Some((word, relative_offset)) = Self::leading_word(trimmed) {
            let offset = relative_offset + trim_prefix;
            if let Some((_, kind, message)) = CLOSER_KEYWORDS.iter().find(|(k, _, _)| *k == word) {
                return ExprParseResult {
                    valid: false,
                    root: ExprNode::with_children(*kind, if has_yield { yield_child() } else { vec![] }),
                    diagnostics: vec![ExprDiagnostic {
                        message: message.to_string(),
                        location_start_byte: offset,
                        location_end_byte: offset + word.len(),
                        level: ExprDiagnosticLevel::Error,
                    }],
                };
            }

            if let Some((_, kind)) = OPENER_KEYWORDS.iter().find(|(k, _)| *k == word) {
                let closed_inline = Self::contains_word(trimmed, "end");
                if closed_inline {
                    return ExprParseResult {
                        valid: true,
                        root: ExprNode::with_children(
                            ExprNodeKind::Other,
                            if has_yield { yield_child() } else { vec![] },
                        ),
                        diagnostics: Vec::new(),
                    };
                }
                return ExprParseResult {
                    valid: false,
                    root: ExprNode::with_children(*kind, if has_yield { yield_child() } else { vec![] }),
                    diagnostics: vec![ExprDiagnostic {
                        message: format!("expected 'end' to close '{word}'"),
                        location_start_byte: offset,
                        location_end_byte: offset + word.len(),
                        level: ExprDiagnosticLevel::Error,
                    }],
                };
            }
        }

        if Self::ends_with_block_opener(trimmed) {
            let closed_inline = Self::contains_word(trimmed, "end") || trimmed.contains('}');
            if !closed_inline {
                return ExprParseResult {
                    valid: false,
                    root: ExprNode::with_children(
                        ExprNodeKind::Block,
                        if has_yield { yield_child() } else { vec![] },
                    ),
                    diagnostics: vec![ExprDiagnostic {
                        message: "expected block to be closed".to_string(),
                        location_start_byte: 0,
                        location_end_byte: source.len(),
                        level: ExprDiagnosticLevel::Error,
                    }],
                };
            }
        }

        ExprParseResult {
            valid: true,
            root: ExprNode::with_children(ExprNodeKind::Other, if has_yield { yield_child() } else { vec![] }),
            diagnostics: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_if_is_invalid_and_tags_an_if_node() {
        let result = MiniRubyParser::new().parse("if", ExprOptions::default());
        assert!(!result.valid);
        assert_eq!(result.root.kind, ExprNodeKind::If);
    }

    #[test]
    fn if_with_condition_and_inline_end_is_valid() {
        let result = MiniRubyParser::new().parse("if x then 1 else 2 end", ExprOptions::default());
        assert!(result.valid);
    }

    #[test]
    fn bare_elsif_reports_documented_message() {
        let result = MiniRubyParser::new().parse("elsif foo?", ExprOptions::default());
        assert!(!result.valid);
        assert_eq!(result.root.kind, ExprNodeKind::Elsif);
        assert_eq!(result.diagnostics[0].message, "unexpected 'elsif', ignoring it");
    }

    #[test]
    fn bare_end_reports_documented_message() {
        let result = MiniRubyParser::new().parse("end", ExprOptions::default());
        assert_eq!(result.diagnostics[0].message, "unexpected 'end', ignoring it");
        assert_eq!(result.root.kind, ExprNodeKind::End);
    }

    #[test]
    fn yield_keyword_is_valid_and_tagged_anywhere_in_the_tree() {
        let result = MiniRubyParser::new().parse("yield", ExprOptions::default());
        assert!(result.valid);
        assert!(result.root.contains_kind(ExprNodeKind::Yield));
    }

    #[test]
    fn block_opener_without_matching_end_is_invalid() {
        let result = MiniRubyParser::new().parse("items.each do |item|", ExprOptions::default());
        assert!(!result.valid);
        assert_eq!(result.root.kind, ExprNodeKind::Block);
    }

    #[test]
    fn ordinary_expression_is_valid_and_unclassified() {
        let result = MiniRubyParser::new().parse("user.name", ExprOptions::default());
        assert!(result.valid);
        assert_eq!(result.root.kind, ExprNodeKind::Other);
    }
}
