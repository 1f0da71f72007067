//! HTML-specific AST node shapes (spec §3).

use crate::ast::node::NodeHeader;
use crate::ast::node::Node;
use crate::token::Token;

#[derive(Debug, Clone)]
pub struct LiteralNode {
    pub header: NodeHeader,
    pub value: String,
}

/// The four sentinel constructs that share one shape: an opening token, an
/// optional closing token, and a run of children tokens/literals (spec
/// §3: "HTML Doctype / Comment / CDATA / XML-declaration").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelKind {
    Doctype,
    Comment,
    CData,
    XmlDeclaration,
}

#[derive(Debug, Clone)]
pub struct SentinelNode {
    pub header: NodeHeader,
    pub kind: SentinelKind,
    pub opening: Token,
    pub closing: Option<Token>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub header: NodeHeader,
    pub open_tag: Box<Node>,
    pub tag_name: Token,
    pub body: Vec<Node>,
    pub close_tag: Option<Box<Node>>,
    pub is_void: bool,
}

#[derive(Debug, Clone)]
pub struct OpenTagNode {
    pub header: NodeHeader,
    pub tag_name: Token,
    pub children: Vec<Node>,
    pub tag_end: Token,
}

#[derive(Debug, Clone)]
pub struct CloseTagNode {
    pub header: NodeHeader,
    pub tag_name: Token,
}

#[derive(Debug, Clone)]
pub struct AttributeNode {
    pub header: NodeHeader,
    pub name: Box<Node>,
    pub equals: Option<Token>,
    pub value: Option<Box<Node>>,
}

#[derive(Debug, Clone)]
pub struct AttributeValueNode {
    pub header: NodeHeader,
    pub open_quote: Option<Token>,
    pub children: Vec<Node>,
    pub close_quote: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct AttributeNameNode {
    pub header: NodeHeader,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct WhitespaceNode {
    pub header: NodeHeader,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct DocumentNode {
    pub header: NodeHeader,
    pub children: Vec<Node>,
}
