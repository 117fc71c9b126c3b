//! Keeps every observed toggle body holding at least one editable line.
//!
//! The same ensure step runs synchronously before the caret is placed in a
//! body and again whenever child-list mutations touching an observed body are
//! delivered. It only ever adds a missing line, so running it redundantly or
//! interleaved with user edits is harmless.

use crate::block::BlockTag;
use crate::dom::{MutationKind, Node, NodeId, Surface};
use crate::ops::{Op, Path, Transaction};
use crate::query::{children_at, element_at, find_all, find_all_within, path_of};

/// Starts observing the body at `body` (once per body) and makes sure it
/// holds a line.
pub fn observe_body(surface: &mut Surface, body: &[usize]) {
    let Some(el) = element_at(surface.doc(), body) else {
        return;
    };
    if !el.is(BlockTag::ToggleBody) {
        return;
    }
    let id = el.id;
    if surface.observed_bodies.insert(id) {
        tracing::trace!(body = id.0, "observing toggle body");
    }
    ensure_persistent_line(surface, body);
}

/// Observes every toggle body currently in the document.
pub fn observe_all(surface: &mut Surface) {
    for body in find_all(surface.doc(), BlockTag::ToggleBody) {
        observe_body(surface, &body);
    }
}

/// Appends an empty line when the body holds none. Returns whether a line was
/// added.
pub fn ensure_persistent_line(surface: &mut Surface, body: &[usize]) -> bool {
    if element_at(surface.doc(), body).is_none() {
        return false;
    }
    if !find_all_within(surface.doc(), body, BlockTag::ToggleLine).is_empty() {
        return false;
    }
    let index = children_at(surface.doc(), body).map_or(0, <[Node]>::len);
    let mut path = body.to_vec();
    path.push(index);
    let tx = Transaction::new(vec![Op::InsertNode {
        path,
        node: Node::toggle_line(),
    }])
    .source("guard:ensure_line");
    match surface.apply(tx) {
        Ok(()) => {
            tracing::debug!(?body, "restored empty toggle body line");
            true
        }
        Err(err) => {
            tracing::warn!(%err, "failed to restore toggle body line");
            false
        }
    }
}

/// Returns the line the caret should land on inside `body`: the last line if
/// it is blank, otherwise a freshly appended one.
pub fn ensure_body_line(surface: &mut Surface, body: &[usize]) -> Option<Path> {
    observe_body(surface, body);

    let last = find_all_within(surface.doc(), body, BlockTag::ToggleLine).pop()?;
    let line = element_at(surface.doc(), &last)?;
    if line.text_content().trim().is_empty() {
        if line.children.is_empty() {
            let mut br_path = last.clone();
            br_path.push(0);
            if let Err(err) = surface.apply(Transaction::new(vec![Op::InsertNode {
                path: br_path,
                node: Node::line_break(),
            }])) {
                tracing::warn!(%err, "failed to fill blank body line");
            }
        }
        return Some(last);
    }

    let index = children_at(surface.doc(), body).map_or(0, <[Node]>::len);
    let mut path = body.to_vec();
    path.push(index);
    surface
        .apply(Transaction::new(vec![Op::InsertNode {
            path: path.clone(),
            node: Node::toggle_line(),
        }]))
        .ok()?;
    Some(path)
}

/// Delivers pending child-list records to the observed bodies they target.
/// Bodies that left the document are disconnected. Returns how many lines
/// were restored.
pub fn deliver_mutations(surface: &mut Surface) -> usize {
    let records = surface.take_mutations();
    let mut targets: Vec<NodeId> = Vec::new();
    for record in records {
        if record.kind != MutationKind::ChildList {
            continue;
        }
        let Some(target) = record.target else {
            continue;
        };
        if surface.is_observing(target) && !targets.contains(&target) {
            targets.push(target);
        }
    }

    let mut restored = 0;
    for target in targets {
        let Some(body) = path_of(surface.doc(), target) else {
            surface.observed_bodies.remove(&target);
            continue;
        };
        if ensure_persistent_line(surface, &body) {
            restored += 1;
        }
    }
    restored
}

/// Drops observers whose bodies are no longer in the document.
pub fn disconnect_detached(surface: &mut Surface) {
    let detached: Vec<NodeId> = surface
        .observed_bodies
        .iter()
        .copied()
        .filter(|id| path_of(surface.doc(), *id).is_none())
        .collect();
    for id in detached {
        surface.observed_bodies.remove(&id);
    }
}

/// Makes sure a line element has something to hold the caret.
pub(crate) fn ensure_line_placeholder(surface: &mut Surface, line: &[usize]) {
    let Some(el) = element_at(surface.doc(), line) else {
        return;
    };
    if !el.children.is_empty() {
        return;
    }
    let mut path = line.to_vec();
    path.push(0);
    if let Err(err) = surface.apply(Transaction::new(vec![Op::InsertNode {
        path,
        node: Node::line_break(),
    }])) {
        tracing::warn!(%err, "failed to insert line placeholder");
    }
}
