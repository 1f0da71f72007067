//! AST node shapes (spec §3) and the shared diagnostic type they carry.

pub mod diagnostics;
pub mod html;
pub mod node;
pub mod template;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use html::*;
pub use node::{Node, NodeHeader};
pub use template::*;
