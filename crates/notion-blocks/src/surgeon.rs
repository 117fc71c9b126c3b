use std::ops::Range;

use crate::dom::{Node, Point, Selection, Surface};
use crate::error::{MarkupError, SurgeryError};
use crate::markup::{FragmentParser, TemplateParser};
use crate::ops::{Op, Transaction};
use crate::query::{node_at, parent_path};

/// Parses with the host's parser when there is one, falling back to the
/// template parser. Both failing is the only error.
pub fn parse_fragment(
    markup: &str,
    host: Option<&dyn FragmentParser>,
) -> Result<Vec<Node>, MarkupError> {
    if let Some(host) = host {
        match host.parse_fragment(markup) {
            Ok(nodes) => return Ok(nodes),
            Err(err) => {
                tracing::warn!(%err, "host fragment parser failed, using template parser");
            }
        }
    }
    TemplateParser.parse_fragment(markup)
}

/// Replaces `span` of the text node at `text_path` with the parsed `markup`
/// and collapses the selection right after the last inserted node.
///
/// Nothing is touched unless the fragment parses and every edit applies.
pub fn replace_span(
    surface: &mut Surface,
    text_path: &[usize],
    span: Range<usize>,
    markup: &str,
    host: Option<&dyn FragmentParser>,
) -> Result<Point, SurgeryError> {
    let Some(Node::Text(text_node)) = node_at(surface.doc(), text_path) else {
        return Err(SurgeryError::NotText(text_path.to_vec()));
    };
    let text = &text_node.text;
    if span.start > span.end
        || span.end > text.len()
        || !text.is_char_boundary(span.start)
        || !text.is_char_boundary(span.end)
    {
        return Err(SurgeryError::SpanOutOfBounds {
            start: span.start,
            end: span.end,
        });
    }
    let before = text[..span.start].to_string();
    let after = text[span.end..].to_string();

    let fragment = parse_fragment(markup, host)?;

    let Some((parent, index)) = parent_path(text_path) else {
        return Err(SurgeryError::NotText(text_path.to_vec()));
    };

    let mut replacement: Vec<Node> = Vec::new();
    if !before.is_empty() {
        replacement.push(Node::text(before));
    }
    let first_inserted = index + replacement.len();
    let inserted = fragment.len();
    replacement.extend(fragment);
    if !after.is_empty() {
        replacement.push(Node::text(after));
    }

    let caret = if inserted > 0 {
        Point::new(parent.to_vec(), first_inserted + inserted)
    } else if first_inserted > index {
        // Nothing inserted: stay where the span started.
        let mut path = parent.to_vec();
        path.push(index);
        Point::new(path, span.start)
    } else {
        Point::new(parent.to_vec(), index)
    };

    let mut ops = vec![Op::RemoveNode {
        path: text_path.to_vec(),
    }];
    for (offset, node) in replacement.into_iter().enumerate() {
        let mut path = parent.to_vec();
        path.push(index + offset);
        ops.push(Op::InsertNode { path, node });
    }

    surface.apply(
        Transaction::new(ops)
            .selection_after(Selection::collapsed(caret.clone()))
            .source("surgeon:replace_span"),
    )?;
    Ok(caret)
}
