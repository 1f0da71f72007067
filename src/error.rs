//! Crate-level error type for failures that abort parsing outright.
//!
//! Almost everything the parser encounters is recorded as a [`Diagnostic`]
//! (`crate::ast::Diagnostic`) on a node and parsing continues — these are
//! the rare conditions that can't be. Hand-written `Display`/`Error`, no
//! `thiserror`, matching the teacher's own `ParserError` enum.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The lexer's stall detector fired: forward progress could not be
    /// made at some position and the token stream was truncated.
    LexerStalled { position: usize },
    /// A control-structure rewrite produced a tree deeper than the parser
    /// is willing to build; guards against pathological/adversarial input.
    AllocationFailure { detail: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::LexerStalled { position } => {
                write!(f, "lexer stalled at byte offset {position}")
            }
            CoreError::AllocationFailure { detail } => {
                write!(f, "allocation failure: {detail}")
            }
        }
    }
}

impl std::error::Error for CoreError {}
