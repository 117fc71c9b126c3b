use crate::block::BlockTag;
use crate::dom::{Node, Point, Surface, ZERO_WIDTH_SPACE};
use crate::grammar::{IntentKind, LineIntent};
use crate::guard::{ensure_body_line, ensure_line_placeholder, observe_body};
use crate::ops::{AttrPatch, Op, Path, Transaction};
use crate::query::{
    ancestor_with, element_at, end_point, find_all_within, find_first_within, find_last,
    first_text_descendant, node_at, start_point,
};

/// Places the caret inside the block that was just inserted for `intent`.
/// `inserted_end` is the boundary right after the inserted nodes; the block
/// is looked up again by tag starting from there. If it cannot be found the
/// selection is left alone.
pub fn focus_after_insert(surface: &mut Surface, intent: &LineIntent, inserted_end: &Point) {
    let has_content = intent.has_content();
    match &intent.kind {
        IntentKind::Toggle => {
            if let Some(summary) = locate_inserted(surface, inserted_end, BlockTag::ToggleSummary) {
                focus_new_summary(surface, summary, has_content);
            }
        }
        IntentKind::Bullet => {
            if let Some(line) = locate_inserted(surface, inserted_end, BlockTag::BulletLine) {
                focus_list_line(surface, line, has_content);
            }
        }
        IntentKind::Ordered => {
            if let Some(line) = locate_inserted(surface, inserted_end, BlockTag::OrderedLine) {
                focus_list_line(surface, line, has_content);
            }
        }
        IntentKind::Heading { .. } => {
            if let Some(heading) = locate_inserted(surface, inserted_end, BlockTag::Heading) {
                focus_heading(surface, heading, has_content);
            }
        }
        IntentKind::Video { .. } => {
            if let Some(sentinel) = locate_inserted(surface, inserted_end, BlockTag::AfterVideo) {
                surface.set_caret(Point::new(sentinel, 0));
            }
        }
    }
}

/// The last element carrying `tag` in the node just before `inserted_end`,
/// falling back to the last one in the document.
fn locate_inserted(surface: &Surface, inserted_end: &Point, tag: BlockTag) -> Option<Path> {
    let doc = surface.doc();
    if inserted_end.offset > 0 {
        let mut node = inserted_end.path.clone();
        node.push(inserted_end.offset - 1);
        if let Some(found) = find_all_within(doc, &node, tag).pop() {
            return Some(found);
        }
        if element_at(doc, &node).is_some_and(|el| el.is(tag)) {
            return Some(node);
        }
    }
    find_last(doc, tag)
}

fn focus_new_summary(surface: &mut Surface, summary: Path, has_content: bool) {
    let body = ancestor_with(surface.doc(), &summary, BlockTag::Toggle)
        .and_then(|toggle| find_first_within(surface.doc(), &toggle, BlockTag::ToggleBody));
    if let Some(body) = body {
        observe_body(surface, &body);
    }
    focus_summary(surface, &summary, has_content);
}

fn focus_list_line(surface: &mut Surface, line: Path, has_content: bool) {
    ensure_line_placeholder(surface, &line);
    let Some(el) = element_at(surface.doc(), &line) else {
        return;
    };
    let point = match el.children.last() {
        Some(Node::Text(t)) if has_content => {
            let mut path = line.clone();
            path.push(el.children.len() - 1);
            Point::new(path, t.text.len())
        }
        _ => Point::new(line, 0),
    };
    surface.set_caret(point);
}

fn focus_heading(surface: &mut Surface, heading: Path, has_content: bool) {
    let point = if has_content {
        end_point(surface.doc(), &heading)
    } else {
        start_point(surface.doc(), &heading)
    };
    surface.set_caret(point);
}

/// At the end of the summary, or at its start just past the zero-width
/// placeholder.
pub fn focus_summary(surface: &mut Surface, summary: &[usize], at_end: bool) {
    let doc = surface.doc();
    if element_at(doc, summary).is_none() {
        return;
    }
    let point = if at_end {
        end_point(doc, summary)
    } else {
        match first_text_descendant(doc, summary) {
            Some(text_path) => {
                let offset = match node_at(doc, &text_path) {
                    Some(Node::Text(t)) if t.text.starts_with(ZERO_WIDTH_SPACE) => {
                        ZERO_WIDTH_SPACE.len_utf8()
                    }
                    _ => 0,
                };
                Point::new(text_path, offset)
            }
            None => Point::new(summary.to_vec(), 0),
        }
    };
    surface.set_caret(point);
}

/// Opens the toggle and puts the caret on a blank body line.
pub fn focus_toggle_body(surface: &mut Surface, toggle: &[usize]) {
    let Some(body) = find_first_within(surface.doc(), toggle, BlockTag::ToggleBody) else {
        return;
    };
    if let Err(err) = surface.apply(Transaction::new(vec![Op::SetAttrs {
        path: toggle.to_vec(),
        patch: AttrPatch::set("open", ""),
    }])) {
        tracing::warn!(%err, "failed to open toggle");
    }
    let Some(line) = ensure_body_line(surface, &body) else {
        return;
    };
    let point = end_point(surface.doc(), &line);
    surface.set_caret(point);
}
