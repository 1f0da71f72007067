mod common;

use ehtml::ast::Node;
use ehtml::{parse, ParseOptions};
use rstest::rstest;

#[rstest]
#[case("<%= while x %>a<%= end %>")]
#[case("<%= until x %>a<%= end %>")]
#[case("<%= for i in y %>a<%= end %>")]
fn loop_variants_group_into_a_loop_node(#[case] src: &str) {
    common::init();
    let doc = parse(src, ParseOptions::default()).unwrap();
    assert!(matches!(doc.children[0], Node::Loop(_)));
}

#[test]
fn begin_rescue_rescue_else_ensure_end_builds_a_rescue_chain() {
    common::init();
    let src = "<%= begin %>a<%= rescue => e %>b<%= rescue => f %>c<%= else %>d<%= ensure %>e<%= end %>";
    let doc = parse(src, ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Begin(begin) => {
            assert!(begin.end.is_some());
            let chain = begin.rescue_chain.as_deref().expect("expected a rescue chain");
            assert!(chain.next.is_some());
            assert!(begin.else_clause.is_some());
            assert!(begin.ensure_clause.is_some());
        }
        other => panic!("expected a Begin node, got {other:?}"),
    }
}

#[test]
fn block_closed_with_brace_uses_block_close_terminator() {
    common::init();
    let doc = parse("<%= items.each do |i| %>x<%= } %>", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Block(block) => {
            assert!(matches!(
                block.terminator,
                Some(ehtml::ast::BlockTerminator::BlockClose(_))
            ));
        }
        other => panic!("expected a Block node, got {other:?}"),
    }
}

#[test]
fn nested_if_inside_element_body_is_grouped_before_its_parent() {
    common::init();
    let doc = parse("<div><%= if x %>y<%= end %></div>", ParseOptions::default()).unwrap();
    match &doc.children[0] {
        Node::Element(el) => {
            assert!(el.body.iter().any(|n| matches!(n, Node::If(_))));
        }
        other => panic!("expected an element, got {other:?}"),
    }
}

#[test]
fn yield_block_becomes_a_yield_node_even_outside_any_control_structure() {
    common::init();
    let doc = parse("<%= yield %>", ParseOptions::default()).unwrap();
    assert!(matches!(doc.children[0], Node::Yield(_)));
}
