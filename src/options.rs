//! Caller-facing parse options and version metadata (spec §2.1, §7).

/// Options threaded through the parser (C5) and the rewriter/C8 pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// When `false`, whitespace-only and newline-only text nodes are
    /// dropped from the tree instead of becoming `Literal` children.
    pub track_whitespace: bool,
    /// Passed through to the expression parser (C8) when re-parsing
    /// extracted script for expression-level diagnostics: accept
    /// fragments that would not be valid as a standalone program.
    pub partial_script: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            track_whitespace: true,
            partial_script: true,
        }
    }
}

/// Implementation and bundled expression-parser version, returned by the
/// version-query entry point (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub implementation: &'static str,
    pub expression_parser: &'static str,
}

impl Version {
    pub fn current() -> Self {
        Self {
            implementation: env!("CARGO_PKG_VERSION"),
            expression_parser: "mini-ruby-stub-0.1",
        }
    }
}
