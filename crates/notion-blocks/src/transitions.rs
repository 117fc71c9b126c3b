//! Backspace and Enter at block boundaries: leaving a list, leaving a toggle
//! body, deleting a toggle from its summary and expanding or chaining toggles.
//!
//! Each handler returns `None` when its preconditions don't hold so the key
//! can fall through to the next handler or to the host's default editing.

use serde::{Deserialize, Serialize};

use crate::block::BlockTag;
use crate::caret::{focus_summary, focus_toggle_body};
use crate::dom::{ElementNode, Node, NodeId, Point, Selection, Surface};
use crate::guard::{ensure_line_placeholder, observe_body};
use crate::ops::{AttrPatch, Op, Path, Transaction};
use crate::query::{
    ancestor_with, children_at, element_at, end_point, find_first_within, is_at_start_of,
    parent_path, path_of, sibling_with, start_point, text_before, visible_text,
};
use crate::render::render_toggle;
use crate::surgeon::parse_fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// A list item became a plain line, splitting its list around it.
    ListLineToPlainLine,
    /// Backspace at the start of a toggle's first body line.
    BodyStartToSummary,
    /// Backspace at the start of a summary deleted the whole toggle.
    RemoveToggle,
    ExpandToggle,
    /// Enter on an empty closed toggle replaced it with a plain line.
    RemoveEmptyToggle,
    InsertToggleBelow,
    FlipOpen,
}

fn collapsed_caret(surface: &Surface) -> Option<Point> {
    let selection = surface.selection()?;
    selection.is_collapsed().then(|| selection.focus.clone())
}

/// Backspace at the very start of a list line or of a toggle's first body
/// line.
pub fn backspace_at_line_start(surface: &mut Surface) -> Option<Transition> {
    let caret = collapsed_caret(surface)?;
    let doc = surface.doc();

    let list_line = ancestor_with(doc, &caret.path, BlockTag::BulletLine)
        .or_else(|| ancestor_with(doc, &caret.path, BlockTag::OrderedLine));
    if let Some(line) = list_line {
        if !visible_text(&text_before(doc, &line, &caret)).is_empty() {
            return None;
        }
        let new_line = convert_list_line(surface, &line)?;
        let point = start_point(surface.doc(), &new_line);
        surface.set_caret(point);
        tracing::debug!(?new_line, "list line converted to plain line");
        return Some(Transition::ListLineToPlainLine);
    }

    let line = ancestor_with(doc, &caret.path, BlockTag::ToggleLine)?;
    let body = ancestor_with(doc, &line, BlockTag::ToggleBody)?;
    let toggle = ancestor_with(doc, &body, BlockTag::Toggle)?;
    if find_first_within(doc, &body, BlockTag::ToggleLine)? != line {
        return None;
    }
    if !visible_text(&text_before(doc, &line, &caret)).is_empty() {
        return None;
    }

    observe_body(surface, &body);
    ensure_line_placeholder(surface, &line);
    if let Some(summary) = find_first_within(surface.doc(), &toggle, BlockTag::ToggleSummary) {
        focus_summary(surface, &summary, false);
    }
    Some(Transition::BodyStartToSummary)
}

/// Backspace at the start of a summary removes the toggle with its body.
pub fn backspace_at_summary_start(surface: &mut Surface) -> Option<Transition> {
    let caret = collapsed_caret(surface)?;
    let doc = surface.doc();
    let summary = ancestor_with(doc, &caret.path, BlockTag::ToggleSummary)?;
    if !is_at_start_of(doc, &summary, &caret) {
        return None;
    }
    let toggle = ancestor_with(doc, &summary, BlockTag::Toggle)?;
    remove_toggle_and_focus(surface, &toggle)?;
    Some(Transition::RemoveToggle)
}

/// Enter inside a summary. An open toggle moves the caret into its body; a
/// closed empty one turns into a plain line; a closed one with a summary
/// chains a new closed toggle below.
pub fn enter_on_summary(surface: &mut Surface) -> Option<Transition> {
    let caret = surface.selection()?.focus.clone();
    let doc = surface.doc();
    let summary = ancestor_with(doc, &caret.path, BlockTag::ToggleSummary)?;
    let toggle = ancestor_with(doc, &summary, BlockTag::Toggle)?;
    let toggle_el = element_at(doc, &toggle)?;

    if toggle_el.has_attr("open") {
        focus_toggle_body(surface, &toggle);
        return Some(Transition::ExpandToggle);
    }
    let summary_text = element_at(doc, &summary)?.text_content();
    if visible_text(&summary_text).is_empty() {
        replace_with_plain_line(surface, &toggle)?;
        return Some(Transition::RemoveEmptyToggle);
    }
    insert_toggle_below(surface, &toggle)?;
    Some(Transition::InsertToggleBelow)
}

/// Alt+Enter anywhere inside a toggle opens or closes it.
pub fn flip_open(surface: &mut Surface) -> Option<Transition> {
    let caret = surface.selection()?.focus.clone();
    let toggle = ancestor_with(surface.doc(), &caret.path, BlockTag::Toggle)?;
    let open = element_at(surface.doc(), &toggle)?.has_attr("open");
    let patch = if open {
        AttrPatch::remove("open")
    } else {
        AttrPatch::set("open", "")
    };
    surface
        .apply(
            Transaction::new(vec![Op::SetAttrs {
                path: toggle.clone(),
                patch,
            }])
            .source("transitions:flip_open"),
        )
        .ok()?;
    tracing::debug!(?toggle, open = !open, "toggle flipped");
    Some(Transition::FlipOpen)
}

/// Turns the list item at `line` into a plain `data-notion-toggle-line`
/// placed where the item was. Items after it move into a new list of the same
/// kind right below the new line; an ordered continuation keeps counting.
/// Returns the path of the new line.
pub fn convert_list_line(surface: &mut Surface, line: &[usize]) -> Option<Path> {
    let doc = surface.doc();
    let line_el = element_at(doc, line)?;
    let (list_path, k) = parent_path(line)?;

    let mut new_line = ElementNode::new("div").tagged(BlockTag::ToggleLine);
    new_line.children = line_el.children.clone();
    if new_line.children.is_empty() {
        new_line.children.push(Node::line_break());
    }

    let wrapper = ancestor_with(doc, list_path, BlockTag::Bullet)
        .or_else(|| ancestor_with(doc, list_path, BlockTag::Ordered));
    let Some(wrapper) = wrapper else {
        // A stray item outside any wrapper is swapped in place.
        surface
            .apply(
                Transaction::new(vec![
                    Op::RemoveNode {
                        path: line.to_vec(),
                    },
                    Op::InsertNode {
                        path: line.to_vec(),
                        node: Node::Element(new_line),
                    },
                ])
                .source("transitions:list_line"),
            )
            .ok()?;
        return Some(line.to_vec());
    };

    let list_el = element_at(doc, list_path)?;
    let wrapper_el = element_at(doc, &wrapper)?;
    let (parent, w) = parent_path(&wrapper)?;
    let after_items: Vec<Node> = list_el.children.get(k + 1..)?.to_vec();

    let mut ops = Vec::new();
    for j in (k + 1..list_el.children.len()).rev() {
        let mut path = list_path.to_vec();
        path.push(j);
        ops.push(Op::RemoveNode { path });
    }
    ops.push(Op::RemoveNode {
        path: line.to_vec(),
    });

    let wrapper_removed = k == 0;
    if wrapper_removed {
        ops.push(Op::RemoveNode {
            path: wrapper.clone(),
        });
    }
    let insert_ix = if wrapper_removed { w } else { w + 1 };
    let mut new_line_path = parent.to_vec();
    new_line_path.push(insert_ix);
    ops.push(Op::InsertNode {
        path: new_line_path.clone(),
        node: Node::Element(new_line),
    });

    if !after_items.is_empty() {
        let mut list = ElementNode::new(list_el.tag.clone());
        if list_el.tag == "ol" {
            let base = list_el
                .attr("start")
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(1);
            let before = list_el.children[..k]
                .iter()
                .filter(|n| matches!(n, Node::Element(_)))
                .count() as i64;
            list = list.with_attr("start", (base + before + 1).to_string());
        }
        list.children = after_items;
        let kind = if wrapper_el.is(BlockTag::Ordered) {
            BlockTag::Ordered
        } else {
            BlockTag::Bullet
        };
        let mut path = parent.to_vec();
        path.push(insert_ix + 1);
        ops.push(Op::InsertNode {
            path,
            node: Node::Element(
                ElementNode::new("div")
                    .tagged(kind)
                    .with_child(Node::Element(list)),
            ),
        });
    }

    surface
        .apply(Transaction::new(ops).source("transitions:list_line"))
        .ok()?;
    Some(new_line_path)
}

/// Removes the toggle at `toggle`, then focuses the end of the previous
/// sibling toggle's summary, else the start of the next one's, else the last
/// line of the container (appending a plain line when there is none).
pub fn remove_toggle_and_focus(surface: &mut Surface, toggle: &[usize]) -> Option<()> {
    let doc = surface.doc();
    let (container, _) = parent_path(toggle)?;
    let container = container.to_vec();
    let summary_id = |sibling: Path| -> Option<NodeId> {
        let summary = find_first_within(doc, &sibling, BlockTag::ToggleSummary)?;
        Some(element_at(doc, &summary)?.id)
    };
    let previous = sibling_with(doc, toggle, BlockTag::Toggle, true).and_then(summary_id);
    let next = sibling_with(doc, toggle, BlockTag::Toggle, false).and_then(summary_id);

    surface
        .apply(
            Transaction::new(vec![Op::RemoveNode {
                path: toggle.to_vec(),
            }])
            .source("transitions:remove_toggle"),
        )
        .ok()?;

    let doc = surface.doc();
    if let Some(summary) = previous.and_then(|id| path_of(doc, id)) {
        focus_summary(surface, &summary, true);
    } else if let Some(summary) = next.and_then(|id| path_of(doc, id)) {
        focus_summary(surface, &summary, false);
    } else {
        focus_container_end(surface, &container);
    }
    Some(())
}

fn focus_container_end(surface: &mut Surface, container: &[usize]) {
    let Some(children) = children_at(surface.doc(), container) else {
        return;
    };
    let len = children.len();
    let needs_line = children.last().is_none_or(|last| last.is(BlockTag::Toggle));
    let target = if needs_line {
        // A toggle body takes a tagged line so the guard has nothing to add.
        let in_body = element_at(surface.doc(), container)
            .is_some_and(|el| el.is(BlockTag::ToggleBody));
        let node = if in_body {
            Node::toggle_line()
        } else {
            Node::plain_line()
        };
        let mut path = container.to_vec();
        path.push(len);
        let tx = Transaction::new(vec![Op::InsertNode {
            path: path.clone(),
            node,
        }]);
        if surface.apply(tx).is_err() {
            return;
        }
        path
    } else {
        let mut path = container.to_vec();
        path.push(len - 1);
        path
    };
    let point = end_point(surface.doc(), &target);
    surface.set_caret(point);
}

fn replace_with_plain_line(surface: &mut Surface, toggle: &[usize]) -> Option<()> {
    let line = toggle.to_vec();
    surface
        .apply(
            Transaction::new(vec![
                Op::RemoveNode { path: line.clone() },
                Op::InsertNode {
                    path: line.clone(),
                    node: Node::plain_line(),
                },
            ])
            .selection_after(Selection::collapsed(Point::new(line, 0)))
            .source("transitions:remove_empty_toggle"),
        )
        .ok()
}

/// Chained toggles always start closed.
fn insert_toggle_below(surface: &mut Surface, toggle: &[usize]) -> Option<()> {
    let (parent, ix) = parent_path(toggle)?;
    let mut path = parent.to_vec();
    path.push(ix + 1);

    let markup = render_toggle("", false);
    let fragment = match parse_fragment(&markup, None) {
        Ok(nodes) => nodes,
        Err(err) => {
            tracing::warn!(%err, "failed to build chained toggle");
            return None;
        }
    };
    let node = fragment.into_iter().find(|n| n.is(BlockTag::Toggle))?;
    surface
        .apply(
            Transaction::new(vec![Op::InsertNode {
                path: path.clone(),
                node,
            }])
            .source("transitions:insert_toggle"),
        )
        .ok()?;

    if let Some(body) = find_first_within(surface.doc(), &path, BlockTag::ToggleBody) {
        observe_body(surface, &body);
    }
    let summary = find_first_within(surface.doc(), &path, BlockTag::ToggleSummary)?;
    focus_summary(surface, &summary, false);
    Some(())
}
