//! Expression-block classifier (C6, spec §4.4).
//!
//! Wraps an [`ExpressionParser`] and derives a [`Classification`] for each
//! template-content block from its parsed tree and diagnostics. The
//! mapping from diagnostic message strings to classifications is
//! isolated behind [`classify`], per the design note in spec §9: "the
//! classifier's dependence on exact diagnostic message strings... implementers
//! should isolate the mapping behind one function so upgrades touch one place."

use log::debug;

use crate::expr::{ExprNodeKind, ExprParseResult, ExpressionParser, ExprOptions};

/// One of the control-structure tags a template-content block can be
/// classified into, or `Unknown` if it does not participate in the
/// control-structure rewrite (spec glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    If,
    Elsif,
    Else,
    End,
    Case,
    CaseMatch,
    When,
    In,
    Begin,
    Rescue,
    Ensure,
    Unless,
    While,
    Until,
    For,
    Block,
    BlockClose,
    Yield,
    Unknown,
}

impl Classification {
    /// Openers that start a balanced control-structure consumption in C7.
    pub fn is_opener(self) -> bool {
        matches!(
            self,
            Classification::If
                | Classification::Case
                | Classification::CaseMatch
                | Classification::Begin
                | Classification::Unless
                | Classification::While
                | Classification::Until
                | Classification::For
                | Classification::Block
        )
    }
}

/// True when `opening` is not a comment (`<%#`), double-percent literal
/// (`<%%`), or double-percent-equals (`<%%=`) delimiter — the three forms
/// the classifier skips entirely (spec §4.4).
pub fn is_classifiable_opening(opening: &str) -> bool {
    !matches!(opening, "<%#" | "<%%" | "<%%=")
}

/// Classifies one template block's raw content, returning the
/// classification plus the full parse result (so callers — C7 and C8 —
/// can reuse the tree and diagnostics without reparsing).
pub fn classify(parser: &dyn ExpressionParser, content: &str, opening: &str) -> (Classification, Option<ExprParseResult>) {
    if !is_classifiable_opening(opening) {
        return (Classification::Unknown, None);
    }

    let result = parser.parse(content, ExprOptions { partial_script: false });
    let classification = classify_result(&result);
    debug!("classifier: `{opening}{content}` -> {classification:?}");
    (classification, Some(result))
}

fn classify_result(result: &ExprParseResult) -> Classification {
    // Rule 1: a yield node anywhere in the tree always wins.
    if result.root.contains_kind(ExprNodeKind::Yield) {
        return Classification::Yield;
    }

    // Rule 2: any other *valid* tree is uninteresting to the rewriter.
    if result.valid {
        return Classification::Unknown;
    }

    // Rule 3: inspect diagnostic messages and the tree, in the fixed
    // precedence order from spec §4.4.
    for diagnostic in &result.diagnostics {
        if let Some(classification) = classification_from_message(&diagnostic.message) {
            return classification;
        }
    }

    classification_from_tree(&result.root)
}

/// The single place exact diagnostic-message strings are mapped to
/// classifications (spec §6, §9).
fn classification_from_message(message: &str) -> Option<Classification> {
    match message {
        "unexpected 'elsif', ignoring it" => Some(Classification::Elsif),
        "unexpected 'else', ignoring it" => Some(Classification::Else),
        "unexpected 'end', ignoring it" => Some(Classification::End),
        "unexpected '}', ignoring it" => Some(Classification::BlockClose),
        "unexpected 'when', ignoring it" => Some(Classification::When),
        "unexpected 'in', ignoring it" => Some(Classification::In),
        "unexpected 'rescue', ignoring it" => Some(Classification::Rescue),
        "unexpected 'ensure', ignoring it" => Some(Classification::Ensure),
        "Invalid yield" => Some(Classification::Yield),
        _ => None,
    }
}

fn classification_from_tree(root: &crate::expr::ExprNode) -> Classification {
    match root.kind {
        ExprNodeKind::Block => Classification::Block,
        ExprNodeKind::If => Classification::If,
        ExprNodeKind::Elsif => Classification::Elsif,
        ExprNodeKind::Else => Classification::Else,
        ExprNodeKind::End => Classification::End,
        ExprNodeKind::Case => Classification::Case,
        ExprNodeKind::CaseMatch => Classification::CaseMatch,
        ExprNodeKind::When => Classification::When,
        ExprNodeKind::In => Classification::In,
        ExprNodeKind::Begin => Classification::Begin,
        ExprNodeKind::Rescue => Classification::Rescue,
        ExprNodeKind::Ensure => Classification::Ensure,
        ExprNodeKind::Unless => Classification::Unless,
        ExprNodeKind::While => Classification::While,
        ExprNodeKind::Until => Classification::Until,
        ExprNodeKind::For => Classification::For,
        ExprNodeKind::BlockClose => Classification::BlockClose,
        ExprNodeKind::Yield => Classification::Yield,
        ExprNodeKind::Other => Classification::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::MiniRubyParser;
    use rstest::rstest;

    #[rstest]
    #[case("if x", Classification::If)]
    #[case("elsif x", Classification::Elsif)]
    #[case("else", Classification::Else)]
    #[case("end", Classification::End)]
    #[case("case x", Classification::Case)]
    #[case("when 1", Classification::When)]
    #[case("in Integer", Classification::In)]
    #[case("begin", Classification::Begin)]
    #[case("rescue => e", Classification::Rescue)]
    #[case("ensure", Classification::Ensure)]
    #[case("unless x", Classification::Unless)]
    #[case("while x", Classification::While)]
    #[case("until x", Classification::Until)]
    #[case("for x in y", Classification::For)]
    #[case("items.each do |i|", Classification::Block)]
    #[case("}", Classification::BlockClose)]
    #[case("yield", Classification::Yield)]
    #[case("user.name", Classification::Unknown)]
    fn classifies_each_keyword_category(#[case] content: &str, #[case] expected: Classification) {
        let parser = MiniRubyParser::new();
        let (classification, _) = classify(&parser, content, "<%");
        assert_eq!(classification, expected);
    }

    #[test]
    fn comment_opening_is_never_classified() {
        let parser = MiniRubyParser::new();
        let (classification, result) = classify(&parser, " if x ", "<%#");
        assert_eq!(classification, Classification::Unknown);
        assert!(result.is_none());
    }

    #[test]
    fn yield_wins_over_every_other_classification() {
        let parser = MiniRubyParser::new();
        let (classification, _) = classify(&parser, "if yield", "<%");
        assert_eq!(classification, Classification::Yield);
    }
}
