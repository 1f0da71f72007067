//! Diagnostic values attached to AST node headers (spec §3.1, §7).
//!
//! Errors are values, never exceptions: a `Diagnostic` is pushed onto the
//! nearest enclosing node's error list (HTML structural errors) or onto
//! the document's top-level list (expression-syntax errors from C8), and
//! parsing continues.

use crate::position::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnexpectedToken,
    MissingCloseTag,
    MismatchedCloseTag,
    StrayCloseTag,
    UnterminatedAttributeValue,
    ExpressionSyntax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Location,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected_actual(
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: Location,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }

    pub fn unexpected_token(location: Location, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let expected = expected.into();
        let actual = actual.into();
        Self::with_expected_actual(
            DiagnosticKind::UnexpectedToken,
            format!("expected {expected}, got {actual}"),
            location,
            expected,
            actual,
        )
    }

    pub fn missing_close_tag(tag_name: &str, opened_at: Location) -> Self {
        Self::new(
            DiagnosticKind::MissingCloseTag,
            format!("expected element `{tag_name}` to have a close tag"),
            opened_at,
        )
    }

    pub fn mismatched_close_tag(expected: &str, actual: &str, location: Location) -> Self {
        Self::with_expected_actual(
            DiagnosticKind::MismatchedCloseTag,
            format!("mismatched closing tag: expected `{expected}`, got `{actual}`"),
            location,
            expected,
            actual,
        )
    }

    pub fn stray_close_tag(tag_name: &str, location: Location) -> Self {
        Self::new(
            DiagnosticKind::StrayCloseTag,
            format!("closing tag `{tag_name}` has no matching open tag"),
            location,
        )
    }

    pub fn unterminated_attribute_value(location: Location) -> Self {
        Self::new(
            DiagnosticKind::UnterminatedAttributeValue,
            "unterminated attribute value",
            location,
        )
    }

    pub fn expression_syntax(message: impl Into<String>, location: Location) -> Self {
        Self::new(DiagnosticKind::ExpressionSyntax, message, location)
    }
}
