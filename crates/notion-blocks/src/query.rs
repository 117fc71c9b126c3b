use crate::block::BlockTag;
use crate::dom::{Document, ElementNode, Node, NodeId, Point, node_ref};
use crate::ops::Path;

pub fn node_at<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    node_ref(doc, path)
}

pub fn element_at<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a ElementNode> {
    node_ref(doc, path)?.as_element()
}

/// Children of the element at `parent_path`; the empty path is the root.
pub fn children_at<'a>(doc: &'a Document, parent_path: &[usize]) -> Option<&'a [Node]> {
    if parent_path.is_empty() {
        return Some(&doc.children);
    }
    element_at(doc, parent_path).map(|el| el.children.as_slice())
}

/// Every element carrying `tag`, in document order.
pub fn find_all(doc: &Document, tag: BlockTag) -> Vec<Path> {
    find_all_within(doc, &[], tag)
}

pub fn find_last(doc: &Document, tag: BlockTag) -> Option<Path> {
    find_all(doc, tag).pop()
}

/// Descendants of `root` (excluding `root` itself) carrying `tag`.
pub fn find_all_within(doc: &Document, root: &[usize], tag: BlockTag) -> Vec<Path> {
    fn walk(children: &[Node], path: &mut Vec<usize>, tag: BlockTag, out: &mut Vec<Path>) {
        for (ix, node) in children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            path.push(ix);
            if el.is(tag) {
                out.push(path.clone());
            }
            walk(&el.children, path, tag, out);
            path.pop();
        }
    }

    let mut out = Vec::new();
    if let Some(children) = children_at(doc, root) {
        walk(children, &mut root.to_vec(), tag, &mut out);
    }
    out
}

pub fn find_first_within(doc: &Document, root: &[usize], tag: BlockTag) -> Option<Path> {
    find_all_within(doc, root, tag).into_iter().next()
}

/// Closest element carrying `tag` at or above `path`.
pub fn ancestor_with(doc: &Document, path: &[usize], tag: BlockTag) -> Option<Path> {
    (1..=path.len())
        .rev()
        .map(|len| &path[..len])
        .find(|candidate| element_at(doc, candidate).is_some_and(|el| el.is(tag)))
        .map(<[usize]>::to_vec)
}

pub fn path_of(doc: &Document, id: NodeId) -> Option<Path> {
    fn walk(children: &[Node], path: &mut Vec<usize>, id: NodeId) -> Option<Path> {
        for (ix, node) in children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            path.push(ix);
            if el.id == id {
                return Some(path.clone());
            }
            if let Some(found) = walk(&el.children, path, id) {
                return Some(found);
            }
            path.pop();
        }
        None
    }

    if id.is_detached() {
        return None;
    }
    walk(&doc.children, &mut Vec::new(), id)
}

/// Text of everything inside `container` that precedes `point`, i.e. what a
/// range from the container's start to the point would stringify to.
pub fn text_before(doc: &Document, container: &[usize], point: &Point) -> String {
    let boundary: Path = match node_ref(doc, &point.path) {
        Some(Node::Text(_)) => point.path.clone(),
        _ => {
            let mut boundary = point.path.clone();
            boundary.push(point.offset);
            boundary
        }
    };

    fn walk(children: &[Node], path: &mut Vec<usize>, boundary: &Path, point: &Point, out: &mut String) {
        for (ix, node) in children.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Text(t) => {
                    if *path < *boundary {
                        out.push_str(&t.text);
                    } else if *path == point.path {
                        let end = crate::dom::clamp_to_char_boundary(&t.text, point.offset);
                        out.push_str(&t.text[..end]);
                    }
                }
                Node::Element(el) => walk(&el.children, path, boundary, point, out),
            }
            path.pop();
        }
    }

    let mut out = String::new();
    if let Some(children) = children_at(doc, container) {
        walk(children, &mut container.to_vec(), &boundary, point, &mut out);
    }
    out
}

/// True when no text at all precedes `point` inside `container`.
pub fn is_at_start_of(doc: &Document, container: &[usize], point: &Point) -> bool {
    text_before(doc, container, point).is_empty()
}

/// Strips zero-width spaces and surrounding whitespace.
pub fn visible_text(text: &str) -> String {
    text.replace(crate::dom::ZERO_WIDTH_SPACE, "").trim().to_string()
}

/// Where a caret lands when an element's contents are selected and collapsed
/// to the start: inside its first text node if it has one.
pub fn start_point(doc: &Document, path: &[usize]) -> Point {
    match first_text_descendant(doc, path) {
        Some(text_path) => Point::new(text_path, 0),
        None => Point::new(path.to_vec(), 0),
    }
}

/// Collapsed-to-end counterpart of [`start_point`].
pub fn end_point(doc: &Document, path: &[usize]) -> Point {
    if let Some(text_path) = last_text_descendant(doc, path) {
        let len = match node_ref(doc, &text_path) {
            Some(Node::Text(t)) => t.text.len(),
            _ => 0,
        };
        return Point::new(text_path, len);
    }
    match node_ref(doc, path) {
        Some(Node::Text(t)) => Point::new(path.to_vec(), t.text.len()),
        _ => {
            let len = children_at(doc, path).map_or(0, <[Node]>::len);
            Point::new(path.to_vec(), len)
        }
    }
}

pub fn first_text_descendant(doc: &Document, path: &[usize]) -> Option<Path> {
    text_descendants(doc, path).into_iter().next()
}

pub fn last_text_descendant(doc: &Document, path: &[usize]) -> Option<Path> {
    text_descendants(doc, path).pop()
}

fn text_descendants(doc: &Document, path: &[usize]) -> Vec<Path> {
    fn walk(children: &[Node], path: &mut Vec<usize>, out: &mut Vec<Path>) {
        for (ix, node) in children.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Text(_) => out.push(path.clone()),
                Node::Element(el) => walk(&el.children, path, out),
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    if let Some(children) = children_at(doc, path) {
        walk(children, &mut path.to_vec(), &mut out);
    }
    out
}

/// Resolves a caret to a text node and byte offset. An element boundary
/// resolves to the child at the offset (or the first child) when that child
/// is text, with the caret at its end.
pub fn caret_text_position(doc: &Document, point: &Point) -> Option<(Path, usize)> {
    match node_ref(doc, &point.path) {
        Some(Node::Text(t)) => Some((
            point.path.clone(),
            crate::dom::clamp_to_char_boundary(&t.text, point.offset),
        )),
        _ => {
            let children = children_at(doc, &point.path)?;
            let ix = if point.offset < children.len() { point.offset } else { 0 };
            match children.get(ix)? {
                Node::Text(t) => {
                    let mut path = point.path.clone();
                    path.push(ix);
                    Some((path, t.text.len()))
                }
                Node::Element(_) => None,
            }
        }
    }
}

pub fn parent_path(path: &[usize]) -> Option<(&[usize], usize)> {
    let (&ix, parent) = path.split_last()?;
    Some((parent, ix))
}

/// Nearest sibling of the node at `path` in the given direction that carries
/// `tag`, skipping anything else in between.
pub fn sibling_with(doc: &Document, path: &[usize], tag: BlockTag, previous: bool) -> Option<Path> {
    let (parent, ix) = parent_path(path)?;
    let siblings = children_at(doc, parent)?;
    let hit = |(i, node): (usize, &Node)| node.is(tag).then_some(i);
    let found = if previous {
        siblings.get(..ix)?.iter().enumerate().rev().find_map(hit)
    } else {
        siblings
            .iter()
            .enumerate()
            .skip(ix + 1)
            .find_map(hit)
    };
    found.map(|i| {
        let mut sibling = parent.to_vec();
        sibling.push(i);
        sibling
    })
}
