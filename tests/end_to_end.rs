mod common;

use ehtml::ast::{Node};
use ehtml::{parse, ParseOptions};

fn children_of(doc: &ehtml::ast::DocumentNode) -> &[Node] {
    &doc.children
}

#[test]
fn plain_html_round_trips_as_an_element_tree() {
    common::init();
    let doc = parse("<div id=\"x\">hello</div>", ParseOptions::default()).unwrap();
    assert_eq!(children_of(&doc).len(), 1);
    match &doc.children[0] {
        Node::Element(el) => {
            assert!(!el.is_void);
            assert!(el.close_tag.is_some());
        }
        other => panic!("expected an element, got {other:?}"),
    }
}

#[test]
fn if_end_groups_into_a_single_if_node() {
    common::init();
    let doc = parse("<%= if x %>yes<%= end %>", ParseOptions::default()).unwrap();
    assert_eq!(doc.children.len(), 1);
    match &doc.children[0] {
        Node::If(if_node) => {
            assert!(if_node.end.is_some());
            assert!(if_node.subsequent.is_none());
        }
        other => panic!("expected an If node, got {other:?}"),
    }
}

#[test]
fn if_elsif_else_end_builds_the_full_subsequent_chain() {
    common::init();
    let src = "<%= if a %>A<%= elsif b %>B<%= else %>C<%= end %>";
    let doc = parse(src, ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::If(if_node) => {
            assert!(if_node.end.is_some());
            match if_node.subsequent.as_deref() {
                Some(ehtml::ast::IfSubsequent::Elsif(elsif)) => match elsif.subsequent.as_deref() {
                    Some(ehtml::ast::IfSubsequent::Else(_)) => {}
                    other => panic!("expected a trailing Else, got {other:?}"),
                },
                other => panic!("expected an Elsif, got {other:?}"),
            }
        }
        other => panic!("expected an If node, got {other:?}"),
    }
}

#[test]
fn case_when_else_end_collects_clauses_in_order() {
    common::init();
    let src = "<%= case x %>pre<%= when 1 %>one<%= when 2 %>two<%= else %>other<%= end %>";
    let doc = parse(src, ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Case(case_node) => {
            assert_eq!(case_node.when_clauses.len(), 2);
            assert!(case_node.else_clause.is_some());
            assert!(case_node.end.is_some());
        }
        other => panic!("expected a Case node, got {other:?}"),
    }
}

#[test]
fn unbalanced_opener_has_no_end_and_no_extra_diagnostic() {
    common::init();
    let doc = parse("<%= if x %>dangling", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::If(if_node) => {
            assert!(if_node.end.is_none());
            assert!(if_node.header.errors.is_empty());
        }
        other => panic!("expected an If node, got {other:?}"),
    }
}

#[test]
fn void_element_with_explicit_close_tag_is_flagged_mismatched() {
    common::init();
    let doc = parse("<br></br>", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Element(el) => {
            assert!(el.is_void);
            let close = el.close_tag.as_ref().expect("close tag should be captured, not swallowed");
            assert!(!close.errors().is_empty());
        }
        other => panic!("expected an element, got {other:?}"),
    }
}

#[test]
fn double_percent_block_is_never_classified_or_grouped() {
    common::init();
    let doc = parse("<%% literal %%>", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::TemplateContent(tc) => {
            assert_eq!(tc.classification, ehtml::classifier::Classification::Unknown);
        }
        other => panic!("expected a raw TemplateContent node, got {other:?}"),
    }
}

#[test]
fn stray_close_tag_is_recorded_without_aborting_the_parse() {
    common::init();
    let doc = parse("<p>hi</p></span>", ParseOptions::default()).unwrap();
    assert_eq!(doc.children.len(), 2);
    match &doc.children[1] {
        Node::Error(diag) => assert_eq!(diag.kind, ehtml::ast::DiagnosticKind::StrayCloseTag),
        other => panic!("expected a stray close tag error node, got {other:?}"),
    }
}

#[test]
fn empty_source_parses_to_an_empty_document() {
    common::init();
    let doc = parse("", ParseOptions::default()).unwrap();
    assert!(doc.children.is_empty());
}

#[test]
fn lone_open_angle_bracket_at_eof_does_not_hang() {
    common::init();
    let doc = parse("text <", ParseOptions::default()).unwrap();
    assert!(!doc.children.is_empty());
}

#[test]
fn template_block_inside_script_is_still_recognized_and_grouped() {
    common::init();
    let doc = parse("<script><%= if x %>y<%= end %></script>", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Element(el) => {
            assert!(el.body.iter().any(|n| matches!(n, Node::If(_))));
        }
        other => panic!("expected an element, got {other:?}"),
    }
}

#[test]
fn unquoted_attribute_value_is_a_single_literal_with_no_error() {
    common::init();
    let doc = parse("<input type=text>", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Element(el) => match el.open_tag.as_ref() {
            Node::OpenTag(open_tag) => {
                let attr = open_tag
                    .children
                    .iter()
                    .find_map(|c| match c {
                        Node::Attribute(a) => Some(a),
                        _ => None,
                    })
                    .expect("expected an attribute node");
                assert!(attr.header.errors.is_empty());
                match attr.value.as_deref() {
                    Some(Node::AttributeValue(v)) => {
                        assert_eq!(v.children.len(), 1);
                        assert!(v.open_quote.is_none());
                    }
                    other => panic!("expected an attribute value, got {other:?}"),
                }
            }
            other => panic!("expected an open tag, got {other:?}"),
        },
        other => panic!("expected an element, got {other:?}"),
    }
}
