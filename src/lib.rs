//! A lexer, HTML parser, and template control-flow analyzer for
//! documents that embed `<% %>`-style template tags in HTML markup.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`lexer`] — a byte/UTF-8-aware state machine producing a flat
//!    token stream (C2).
//! 2. [`parser`] — recursive-descent HTML parsing with open-tag
//!    tracking, foreign content, and structural error recovery (C5).
//! 3. [`classifier`] and [`rewriter`] — classify each `<% %>` block
//!    against an [`expr::ExpressionParser`] and group balanced runs into
//!    nested control-structure nodes (C6/C7).
//! 4. [`expr_report`] — a whole-document expression-syntax pass over a
//!    byte-length-preserving projection of the source (C8), with
//!    [`extractor`] providing that and the inverse HTML-only projection
//!    (C9).
//!
//! [`api`] wires these together; most callers only need [`api::parse`].

pub mod api;
pub mod ast;
pub mod classifier;
pub mod cursor;
pub mod error;
pub mod expr;
pub mod expr_report;
pub mod extractor;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod position;
pub mod rewriter;
pub mod token;

pub use api::{extract_expressions, extract_expressions_with_separators, extract_html, lex, parse, parse_with_parser, version};
pub use ast::{Diagnostic, DiagnosticKind, Node, NodeHeader};
pub use error::CoreError;
pub use options::{ParseOptions, Version};
pub use position::{Location, Position, Range};
pub use token::{Token, TokenKind};
