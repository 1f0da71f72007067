//! The tagged-sum `Node` type and its shared header (spec §3, §9).
//!
//! Every AST node carries `{kind, location, errors}` (the "shared header"
//! from spec §9's polymorphic-AST design note). Rather than virtual
//! dispatch, the core pattern-matches on `Node`'s variants; the only
//! indirection is the `Box` needed to let recursive node shapes (an
//! `Element`'s `open_tag`, an `If`'s `subsequent` chain) live on the heap.

use crate::ast::diagnostics::Diagnostic;
use crate::ast::html::*;
use crate::ast::template::*;
use crate::position::Location;

/// The header every node variant embeds: its source span and its own
/// (never its children's) diagnostic list, per invariant 4 — "errors array
/// is append-only during parsing; never read during parsing decisions."
#[derive(Debug, Clone)]
pub struct NodeHeader {
    pub location: Location,
    pub errors: Vec<Diagnostic>,
}

impl NodeHeader {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Document(DocumentNode),
    Literal(LiteralNode),
    Sentinel(SentinelNode),
    Element(ElementNode),
    OpenTag(OpenTagNode),
    CloseTag(CloseTagNode),
    Attribute(AttributeNode),
    AttributeValue(AttributeValueNode),
    AttributeName(AttributeNameNode),
    Whitespace(WhitespaceNode),
    TemplateContent(TemplateContentNode),
    If(IfNode),
    Elsif(ElsifNode),
    Else(ElseNode),
    End(EndNode),
    Case(CaseNode),
    CaseMatch(CaseMatchNode),
    When(WhenNode),
    In(InNode),
    Begin(BeginNode),
    Rescue(RescueNode),
    Ensure(EnsureNode),
    Unless(UnlessNode),
    Loop(LoopNode),
    Block(BlockNode),
    Yield(YieldNode),
    Error(Diagnostic),
}

impl Node {
    pub fn location(&self) -> Location {
        match self {
            Node::Document(n) => n.header.location,
            Node::Literal(n) => n.header.location,
            Node::Sentinel(n) => n.header.location,
            Node::Element(n) => n.header.location,
            Node::OpenTag(n) => n.header.location,
            Node::CloseTag(n) => n.header.location,
            Node::Attribute(n) => n.header.location,
            Node::AttributeValue(n) => n.header.location,
            Node::AttributeName(n) => n.header.location,
            Node::Whitespace(n) => n.header.location,
            Node::TemplateContent(n) => n.header.location,
            Node::If(n) => n.header.location,
            Node::Elsif(n) => n.header.location,
            Node::Else(n) => n.header.location,
            Node::End(n) => n.header.location,
            Node::Case(n) => n.header.location,
            Node::CaseMatch(n) => n.header.location,
            Node::When(n) => n.header.location,
            Node::In(n) => n.header.location,
            Node::Begin(n) => n.header.location,
            Node::Rescue(n) => n.header.location,
            Node::Ensure(n) => n.header.location,
            Node::Unless(n) => n.header.location,
            Node::Loop(n) => n.header.location,
            Node::Block(n) => n.header.location,
            Node::Yield(n) => n.header.location,
            Node::Error(d) => d.location,
        }
    }

    /// The diagnostics attached directly to this node (never its
    /// children's — see [`NodeHeader`]).
    pub fn errors(&self) -> &[Diagnostic] {
        match self {
            Node::Document(n) => &n.header.errors,
            Node::Literal(n) => &n.header.errors,
            Node::Sentinel(n) => &n.header.errors,
            Node::Element(n) => &n.header.errors,
            Node::OpenTag(n) => &n.header.errors,
            Node::CloseTag(n) => &n.header.errors,
            Node::Attribute(n) => &n.header.errors,
            Node::AttributeValue(n) => &n.header.errors,
            Node::AttributeName(n) => &n.header.errors,
            Node::Whitespace(n) => &n.header.errors,
            Node::TemplateContent(n) => &n.header.errors,
            Node::If(n) => &n.header.errors,
            Node::Elsif(n) => &n.header.errors,
            Node::Else(n) => &n.header.errors,
            Node::End(n) => &n.header.errors,
            Node::Case(n) => &n.header.errors,
            Node::CaseMatch(n) => &n.header.errors,
            Node::When(n) => &n.header.errors,
            Node::In(n) => &n.header.errors,
            Node::Begin(n) => &n.header.errors,
            Node::Rescue(n) => &n.header.errors,
            Node::Ensure(n) => &n.header.errors,
            Node::Unless(n) => &n.header.errors,
            Node::Loop(n) => &n.header.errors,
            Node::Block(n) => &n.header.errors,
            Node::Yield(n) => &n.header.errors,
            Node::Error(_) => &[],
        }
    }

    /// Mutable access to the child-node slot of any variant that has one
    /// — the "small helper that borrows a mutable slot of type 'ordered
    /// list of child nodes'" from spec §9 — used by the rewriter (C7) to
    /// rewrite a parent's child list in place. Returns `None` for variants
    /// with no rewritable child list (leaves, and control nodes whose
    /// children are already grouped).
    pub fn rewritable_children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document(n) => Some(&mut n.children),
            Node::Element(n) => Some(&mut n.body),
            Node::OpenTag(n) => Some(&mut n.children),
            Node::AttributeValue(n) => Some(&mut n.children),
            _ => None,
        }
    }

    /// Every `Box<Node>`/`Vec<Node>` slot a generic tree-walk should
    /// recurse into after a rewrite, so nested elements/attribute values
    /// get rewritten too.
    pub fn descend_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Document(n) => n.children.iter_mut().collect(),
            Node::Element(n) => {
                let mut v = vec![n.open_tag.as_mut()];
                v.extend(n.body.iter_mut());
                if let Some(close) = n.close_tag.as_mut() {
                    v.push(close.as_mut());
                }
                v
            }
            Node::OpenTag(n) => n.children.iter_mut().collect(),
            Node::Sentinel(n) => n.children.iter_mut().collect(),
            Node::Attribute(n) => {
                let mut v = vec![n.name.as_mut()];
                if let Some(value) = n.value.as_mut() {
                    v.push(value.as_mut());
                }
                v
            }
            Node::AttributeValue(n) => n.children.iter_mut().collect(),
            _ => Vec::new(),
        }
    }
}
