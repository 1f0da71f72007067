//! Control-structure rewriter (C7, spec §4.5).
//!
//! A post-order visitor: for every node with a rewritable child list
//! (document children, an element's body, an open tag's children, an
//! attribute value's children) it first recurses into each child, then
//! walks that list left to right, grouping balanced runs of classified
//! `TemplateContent` nodes into the nested control nodes from
//! `ast::template`. C7 transfers ownership of the original
//! `TemplateContentNode`s into the control nodes it builds — nothing is
//! cloned, nothing is re-parsed.

use std::collections::VecDeque;

use log::debug;

use crate::ast::node::{Node, NodeHeader};
use crate::ast::template::{
    BeginNode, BlockNode, BlockTerminator, CaseMatchNode, CaseNode, ElseNode, ElsifNode, EndNode,
    EnsureNode, IfNode, IfSubsequent, InNode, LoopKind, LoopNode, RescueNode, TemplateContentNode,
    UnlessNode, WhenNode, YieldNode,
};
use crate::classifier::Classification;
use crate::position::Location;

/// Folds `opening` together with every location in `rest`, producing the
/// smallest location spanning all of them. `Location::join` takes the min
/// start and max end, so this holds regardless of `rest`'s order — an
/// unterminated control node's location still ends at its last child
/// (spec §4.5), not just its opening tag.
fn join_all(opening: Location, rest: impl IntoIterator<Item = Location>) -> Location {
    rest.into_iter().fold(opening, |acc, loc| acc.join(&loc))
}

/// Rewrites `node` and everything beneath it in place.
pub fn rewrite(node: &mut Node) {
    for child in node.descend_mut() {
        rewrite(child);
    }
    let taken = node.rewritable_children_mut().map(std::mem::take);
    if let Some(taken) = taken {
        let grouped = group_children(taken);
        if let Some(children) = node.rewritable_children_mut() {
            *children = grouped;
        }
    }
}

fn group_children(children: Vec<Node>) -> Vec<Node> {
    let mut queue: VecDeque<Node> = children.into();
    let mut out = Vec::new();
    while let Some(node) = queue.pop_front() {
        match node {
            Node::TemplateContent(tc) if tc.classification.is_opener() => {
                out.push(consume_opener(tc, &mut queue));
            }
            Node::TemplateContent(tc) if tc.classification == Classification::Yield => {
                out.push(Node::Yield(YieldNode {
                    header: NodeHeader::new(tc.header.location),
                    opening: Box::new(Node::TemplateContent(tc)),
                }));
            }
            other => out.push(other),
        }
    }
    out
}

/// Consumes nodes from `queue` up to (but not including) the first node
/// classified as one of `markers`, recursively grouping any nested
/// opener it encounters along the way. Stops at EOF too — an opener
/// whose terminator never arrives ends the scan with no marker found,
/// leaving `end`/`subsequent` fields `None` (spec §4.5: an unbalanced
/// opener is not itself an error).
fn take_children_until(queue: &mut VecDeque<Node>, markers: &[Classification]) -> Vec<Node> {
    let mut acc = Vec::new();
    loop {
        match queue.front() {
            None => break,
            Some(Node::TemplateContent(tc)) if markers.contains(&tc.classification) => break,
            Some(Node::TemplateContent(tc)) if tc.classification.is_opener() => {
                let tc = match queue.pop_front() {
                    Some(Node::TemplateContent(tc)) => tc,
                    _ => unreachable!(),
                };
                acc.push(consume_opener(tc, queue));
            }
            Some(Node::TemplateContent(tc)) if tc.classification == Classification::Yield => {
                let tc = match queue.pop_front() {
                    Some(Node::TemplateContent(tc)) => tc,
                    _ => unreachable!(),
                };
                acc.push(Node::Yield(YieldNode {
                    header: NodeHeader::new(tc.header.location),
                    opening: Box::new(Node::TemplateContent(tc)),
                }));
            }
            Some(_) => acc.push(queue.pop_front().unwrap()),
        }
    }
    acc
}

fn pop_if_classified(queue: &mut VecDeque<Node>, classification: Classification) -> Option<TemplateContentNode> {
    match queue.front() {
        Some(Node::TemplateContent(tc)) if tc.classification == classification => match queue.pop_front() {
            Some(Node::TemplateContent(tc)) => Some(tc),
            _ => unreachable!(),
        },
        _ => None,
    }
}

fn pop_end(queue: &mut VecDeque<Node>) -> Option<Box<Node>> {
    pop_if_classified(queue, Classification::End).map(|tc| Box::new(make_end_node(tc)))
}

fn make_end_node(tc: TemplateContentNode) -> Node {
    let location = tc.header.location;
    Node::End(EndNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
    })
}

fn consume_opener(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> Node {
    debug!("rewriter: grouping opener {:?} at {}", tc.classification, tc.header.location);
    match tc.classification {
        Classification::If => Node::If(consume_if(tc, queue)),
        Classification::Case => Node::Case(consume_case(tc, queue)),
        Classification::CaseMatch => Node::CaseMatch(consume_case_match(tc, queue)),
        Classification::Begin => Node::Begin(consume_begin(tc, queue)),
        Classification::Unless => Node::Unless(consume_unless(tc, queue)),
        Classification::While => Node::Loop(consume_loop(LoopKind::While, tc, queue)),
        Classification::Until => Node::Loop(consume_loop(LoopKind::Until, tc, queue)),
        Classification::For => Node::Loop(consume_loop(LoopKind::For, tc, queue)),
        Classification::Block => Node::Block(consume_block(tc, queue)),
        _ => Node::TemplateContent(tc),
    }
}

fn consume_if(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> IfNode {
    let opening_location = tc.header.location;
    let children = take_children_until(queue, &[Classification::Elsif, Classification::Else, Classification::End]);
    let (subsequent, end) = build_if_tail(queue);
    let location = join_all(
        opening_location,
        children
            .iter()
            .map(|n| n.location())
            .chain(subsequent.as_ref().map(|s| s.location()))
            .chain(end.as_ref().map(|e| e.location())),
    );
    IfNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        children,
        subsequent,
        end,
    }
}

fn build_if_tail(queue: &mut VecDeque<Node>) -> (Option<Box<IfSubsequent>>, Option<Box<Node>>) {
    if let Some(tc) = pop_if_classified(queue, Classification::Elsif) {
        let opening_location = tc.header.location;
        let children = take_children_until(queue, &[Classification::Elsif, Classification::Else, Classification::End]);
        let (tail_subsequent, end) = build_if_tail(queue);
        let location = join_all(
            opening_location,
            children.iter().map(|n| n.location()).chain(tail_subsequent.as_ref().map(|s| s.location())),
        );
        let elsif = ElsifNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(tc)),
            children,
            subsequent: tail_subsequent,
        };
        return (Some(Box::new(IfSubsequent::Elsif(elsif))), end);
    }
    if let Some(tc) = pop_if_classified(queue, Classification::Else) {
        let opening_location = tc.header.location;
        let children = take_children_until(queue, &[Classification::End]);
        let end = pop_end(queue);
        let location = join_all(opening_location, children.iter().map(|n| n.location()));
        let else_node = ElseNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(tc)),
            children,
        };
        return (Some(Box::new(IfSubsequent::Else(else_node))), end);
    }
    (None, pop_end(queue))
}

fn consume_case(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> CaseNode {
    let opening_location = tc.header.location;
    let pre_when_children = take_children_until(queue, &[Classification::When, Classification::Else, Classification::End]);

    let mut when_clauses = Vec::new();
    while let Some(when_tc) = pop_if_classified(queue, Classification::When) {
        let when_opening = when_tc.header.location;
        let children = take_children_until(queue, &[Classification::When, Classification::Else, Classification::End]);
        let location = join_all(when_opening, children.iter().map(|n| n.location()));
        when_clauses.push(WhenNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(when_tc)),
            children,
        });
    }

    let else_clause = pop_if_classified(queue, Classification::Else).map(|else_tc| {
        let else_opening = else_tc.header.location;
        let children = take_children_until(queue, &[Classification::End]);
        let location = join_all(else_opening, children.iter().map(|n| n.location()));
        ElseNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(else_tc)),
            children,
        }
    });

    let end = pop_end(queue);
    let location = join_all(
        opening_location,
        pre_when_children
            .iter()
            .map(|n| n.location())
            .chain(when_clauses.iter().map(|w| w.header.location))
            .chain(else_clause.as_ref().map(|e| e.header.location))
            .chain(end.as_ref().map(|e| e.location())),
    );
    CaseNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        pre_when_children,
        when_clauses,
        else_clause,
        end,
    }
}

fn consume_case_match(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> CaseMatchNode {
    let opening_location = tc.header.location;
    let pre_in_children = take_children_until(queue, &[Classification::In, Classification::Else, Classification::End]);

    let mut in_clauses = Vec::new();
    while let Some(in_tc) = pop_if_classified(queue, Classification::In) {
        let in_opening = in_tc.header.location;
        let children = take_children_until(queue, &[Classification::In, Classification::Else, Classification::End]);
        let location = join_all(in_opening, children.iter().map(|n| n.location()));
        in_clauses.push(InNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(in_tc)),
            children,
        });
    }

    let else_clause = pop_if_classified(queue, Classification::Else).map(|else_tc| {
        let else_opening = else_tc.header.location;
        let children = take_children_until(queue, &[Classification::End]);
        let location = join_all(else_opening, children.iter().map(|n| n.location()));
        ElseNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(else_tc)),
            children,
        }
    });

    let end = pop_end(queue);
    let location = join_all(
        opening_location,
        pre_in_children
            .iter()
            .map(|n| n.location())
            .chain(in_clauses.iter().map(|i| i.header.location))
            .chain(else_clause.as_ref().map(|e| e.header.location))
            .chain(end.as_ref().map(|e| e.location())),
    );
    CaseMatchNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        pre_in_children,
        in_clauses,
        else_clause,
        end,
    }
}

const RESCUE_TERMINATORS: &[Classification] = &[
    Classification::Rescue,
    Classification::Else,
    Classification::Ensure,
    Classification::End,
];

fn build_rescue_chain(queue: &mut VecDeque<Node>) -> Option<Box<RescueNode>> {
    let tc = pop_if_classified(queue, Classification::Rescue)?;
    let opening_location = tc.header.location;
    let children = take_children_until(queue, RESCUE_TERMINATORS);
    let next = build_rescue_chain(queue);
    let location = join_all(
        opening_location,
        children.iter().map(|n| n.location()).chain(next.as_ref().map(|n| n.header.location)),
    );
    Some(Box::new(RescueNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        children,
        next,
    }))
}

fn consume_begin(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> BeginNode {
    let opening_location = tc.header.location;
    let children = take_children_until(queue, RESCUE_TERMINATORS);
    let rescue_chain = build_rescue_chain(queue);

    let else_clause = pop_if_classified(queue, Classification::Else).map(|else_tc| {
        let else_opening = else_tc.header.location;
        let children = take_children_until(queue, &[Classification::Ensure, Classification::End]);
        let location = join_all(else_opening, children.iter().map(|n| n.location()));
        ElseNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(else_tc)),
            children,
        }
    });

    let ensure_clause = pop_if_classified(queue, Classification::Ensure).map(|ensure_tc| {
        let ensure_opening = ensure_tc.header.location;
        let children = take_children_until(queue, &[Classification::End]);
        let location = join_all(ensure_opening, children.iter().map(|n| n.location()));
        EnsureNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(ensure_tc)),
            children,
        }
    });

    let end = pop_end(queue);
    let location = join_all(
        opening_location,
        children
            .iter()
            .map(|n| n.location())
            .chain(rescue_chain.as_ref().map(|r| r.header.location))
            .chain(else_clause.as_ref().map(|e| e.header.location))
            .chain(ensure_clause.as_ref().map(|e| e.header.location))
            .chain(end.as_ref().map(|e| e.location())),
    );
    BeginNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        children,
        rescue_chain,
        else_clause,
        ensure_clause,
        end,
    }
}

fn consume_unless(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> UnlessNode {
    let opening_location = tc.header.location;
    let children = take_children_until(queue, &[Classification::Else, Classification::End]);
    let else_clause = pop_if_classified(queue, Classification::Else).map(|else_tc| {
        let else_opening = else_tc.header.location;
        let else_children = take_children_until(queue, &[Classification::End]);
        let location = join_all(else_opening, else_children.iter().map(|n| n.location()));
        ElseNode {
            header: NodeHeader::new(location),
            opening: Box::new(Node::TemplateContent(else_tc)),
            children: else_children,
        }
    });
    let end = pop_end(queue);
    let location = join_all(
        opening_location,
        children
            .iter()
            .map(|n| n.location())
            .chain(else_clause.as_ref().map(|e| e.header.location))
            .chain(end.as_ref().map(|e| e.location())),
    );
    UnlessNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        children,
        else_clause,
        end,
    }
}

fn consume_loop(kind: LoopKind, tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> LoopNode {
    let opening_location = tc.header.location;
    let children = take_children_until(queue, &[Classification::End]);
    let end = pop_end(queue);
    let location = join_all(
        opening_location,
        children.iter().map(|n| n.location()).chain(end.as_ref().map(|e| e.location())),
    );
    LoopNode {
        header: NodeHeader::new(location),
        kind,
        opening: Box::new(Node::TemplateContent(tc)),
        children,
        end,
    }
}

fn consume_block(tc: TemplateContentNode, queue: &mut VecDeque<Node>) -> BlockNode {
    let opening_location = tc.header.location;
    let children = take_children_until(queue, &[Classification::End, Classification::BlockClose]);
    let terminator = if let Some(end_tc) = pop_if_classified(queue, Classification::End) {
        Some(BlockTerminator::End(Box::new(make_end_node(end_tc))))
    } else {
        pop_if_classified(queue, Classification::BlockClose)
            .map(|close_tc| BlockTerminator::BlockClose(Box::new(Node::TemplateContent(close_tc))))
    };
    let terminator_location = match &terminator {
        Some(BlockTerminator::End(n)) => Some(n.location()),
        Some(BlockTerminator::BlockClose(n)) => Some(n.location()),
        None => None,
    };
    let location = join_all(
        opening_location,
        children.iter().map(|n| n.location()).chain(terminator_location),
    );
    BlockNode {
        header: NodeHeader::new(location),
        opening: Box::new(Node::TemplateContent(tc)),
        children,
        terminator,
    }
}
