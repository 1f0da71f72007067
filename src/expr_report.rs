//! Whole-document expression-syntax reporting (C8, spec §4.7, §6).
//!
//! C6 classifies each `<% %>` block in isolation, but some expression
//! errors only show up once every block's script is read as one program
//! (an unterminated string spanning two blocks, say). C8 projects the
//! whole source through the extractor (C9) into one script with the
//! surrounding HTML blanked out, parses that with `partial_script: true`,
//! and appends whatever the expression parser reports back onto the
//! document's top-level diagnostics, translating its byte offsets back
//! into source positions.

use crate::ast::diagnostics::Diagnostic;
use crate::ast::html::DocumentNode;
use crate::cursor::Cursor;
use crate::expr::{ExprOptions, ExpressionParser};
use crate::extractor;
use crate::position::{Location, Position};

/// Appends one `Diagnostic::expression_syntax` to `document`'s header
/// for every diagnostic the expression parser reports against the
/// whole-source script projection.
pub fn report(source: &str, document: &mut DocumentNode, expr_parser: &dyn ExpressionParser) {
    let projected = extractor::extract_expressions_with_separators(source);
    let result = expr_parser.parse(&projected, ExprOptions { partial_script: true });
    for diagnostic in result.diagnostics {
        let start = offset_to_position(source, diagnostic.location_start_byte);
        let end = offset_to_position(source, diagnostic.location_end_byte);
        document
            .header
            .errors
            .push(Diagnostic::expression_syntax(diagnostic.message, Location::new(start, end)));
    }
}

fn offset_to_position(source: &str, offset: usize) -> Position {
    let mut cursor = Cursor::new(source.as_bytes());
    while cursor.position() < offset && !cursor.at_eof() {
        cursor.advance();
    }
    cursor.current_position()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::MiniRubyParser;

    #[test]
    fn clean_document_reports_nothing() {
        let mut doc = DocumentNode {
            header: crate::ast::node::NodeHeader::new(Location::new(Position::start(), Position::start())),
            children: Vec::new(),
        };
        report("<p><%= name %></p>", &mut doc, &MiniRubyParser::new());
        assert!(doc.header.errors.is_empty());
    }

    #[test]
    fn unterminated_if_is_reported_at_the_keyword_not_the_delimiter() {
        let mut doc = DocumentNode {
            header: crate::ast::node::NodeHeader::new(Location::new(Position::start(), Position::start())),
            children: Vec::new(),
        };
        report("<% if x %>", &mut doc, &MiniRubyParser::new());
        assert_eq!(doc.header.errors.len(), 1);
        assert!(doc.header.errors[0].message.contains("expected 'end' to close 'if'"));
        assert_eq!(doc.header.errors[0].location.start.column, 3);
    }
}
