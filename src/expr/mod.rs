//! The external expression-language parser interface (spec §6).
//!
//! `spec.md` treats the embedded expression language's own parser as an
//! out-of-scope external collaborator: the classifier (C6) and the
//! expression-level error reporter (C8) only need to call it through this
//! trait. [`MiniRubyParser`] is the bundled default implementation,
//! documented in `SPEC_FULL.md` §1.1 as a stand-in a host can swap out for
//! a full expression-language parser behind the same trait.

mod mini_ruby;

pub use mini_ruby::MiniRubyParser;

/// Options passed to the expression parser, mirroring spec §6's
/// `{ partial_script: bool }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprOptions {
    pub partial_script: bool,
}

/// The control-structure categories a parsed expression tree or diagnostic
/// can resolve to (spec glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprNodeKind {
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
    Other,
}

/// One node of the expression parser's own parse tree, walkable in
/// pre-order via [`ExprNode::visit_children`] (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprNode {
    pub kind: ExprNodeKind,
    pub children: Vec<ExprNode>,
}

impl ExprNode {
    pub fn leaf(kind: ExprNodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: ExprNodeKind, children: Vec<ExprNode>) -> Self {
        Self { kind, children }
    }

    /// Pre-order walk of this node and its descendants.
    pub fn visit_children<'a>(&'a self, visitor: &mut impl FnMut(&'a ExprNode)) {
        visitor(self);
        for child in &self.children {
            child.visit_children(visitor);
        }
    }

    pub fn contains_kind(&self, kind: ExprNodeKind) -> bool {
        let mut found = false;
        self.visit_children(&mut |node| {
            if node.kind == kind {
                found = true;
            }
        });
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprDiagnosticLevel {
    Error,
    Warning,
}

/// One diagnostic reported by the expression parser, with byte offsets
/// relative to the content string it was given (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprDiagnostic {
    pub message: String,
    pub location_start_byte: usize,
    pub location_end_byte: usize,
    pub level: ExprDiagnosticLevel,
}

/// The result of parsing one embedded expression block's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprParseResult {
    pub valid: bool,
    pub root: ExprNode,
    pub diagnostics: Vec<ExprDiagnostic>,
}

/// The external expression-language parser interface consumed by C6/C8.
pub trait ExpressionParser {
    fn parse(&self, source: &str, options: ExprOptions) -> ExprParseResult;
}
