use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{DomError, MarkupError};
use crate::markup::{FragmentParser, TemplateParser, to_markup};
use crate::ops::{Op, Path, Transaction};

pub type Attrs = BTreeMap<String, String>;

pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const DETACHED: NodeId = NodeId(0);

    pub fn is_detached(&self) -> bool {
        *self == Self::DETACHED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode { text: text.into() })
    }

    pub fn line_break() -> Self {
        Node::Element(ElementNode::new("br"))
    }

    /// A plain `<div><br></div>` line, the host editor's empty paragraph.
    pub fn plain_line() -> Self {
        Node::Element(ElementNode::new("div").with_child(Node::line_break()))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    #[serde(default, skip_serializing_if = "NodeId::is_detached")]
    pub id: NodeId,
    pub tag: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            id: NodeId::DETACHED,
            tag: tag.into(),
            attrs: Attrs::default(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

/// `target` is the element whose children, text or attributes changed;
/// `None` stands for the editable root itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: Option<NodeId>,
    pub kind: MutationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleBlock {
    pub id: String,
    pub css: String,
}

/// An editable root: the document it hosts, the live selection, the style
/// blocks injected next to it and the mutation records not yet delivered to
/// observers.
#[derive(Debug)]
pub struct Surface {
    id: RootId,
    doc: Document,
    selection: Option<Selection>,
    styles: Vec<StyleBlock>,
    next_node_id: u64,
    pending_mutations: Vec<MutationRecord>,
    pub(crate) observed_bodies: HashSet<NodeId>,
}

impl Surface {
    pub fn new(id: RootId, mut doc: Document) -> Self {
        let mut next_node_id = 1;
        for child in &mut doc.children {
            assign_node_ids(child, &mut next_node_id);
        }
        Self {
            id,
            doc,
            selection: None,
            styles: Vec::new(),
            next_node_id,
            pending_mutations: Vec::new(),
            observed_bodies: HashSet::new(),
        }
    }

    pub fn from_markup(id: RootId, markup: &str) -> Result<Self, MarkupError> {
        let children = TemplateParser.parse_fragment(markup)?;
        Ok(Self::new(id, Document { children }))
    }

    pub fn id(&self) -> RootId {
        self.id
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn to_markup(&self) -> String {
        to_markup(&self.doc.children)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn set_caret(&mut self, point: Point) {
        self.selection = Some(Selection::collapsed(point));
    }

    pub fn styles(&self) -> &[StyleBlock] {
        &self.styles
    }

    pub(crate) fn styles_mut(&mut self) -> &mut Vec<StyleBlock> {
        &mut self.styles
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.pending_mutations.is_empty()
    }

    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending_mutations)
    }

    pub fn is_observing(&self, body: NodeId) -> bool {
        self.observed_bodies.contains(&body)
    }

    /// Applies every op of `tx` or none of them. Child-list changes are queued
    /// as mutation records for the next delivery.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), DomError> {
        tracing::trace!(
            source = tx.source.as_deref(),
            ops = tx.ops.len(),
            "applying transaction"
        );
        let mut doc = self.doc.clone();
        let mut selection = self.selection.clone();
        let mut next_node_id = self.next_node_id;
        let mut records = Vec::new();

        for op in tx.ops {
            apply_op_to(&mut doc, &mut selection, &mut next_node_id, &mut records, op)?;
        }

        if let Some(sel) = tx.selection_after {
            selection = Some(sel);
        }

        self.doc = doc;
        self.selection = selection;
        self.next_node_id = next_node_id;
        self.pending_mutations.extend(records);
        Ok(())
    }
}

fn assign_node_ids(node: &mut Node, next: &mut u64) {
    if let Node::Element(el) = node {
        if el.id.is_detached() {
            el.id = NodeId(*next);
            *next += 1;
        }
        for child in &mut el.children {
            assign_node_ids(child, next);
        }
    }
}

fn apply_op_to(
    doc: &mut Document,
    selection: &mut Option<Selection>,
    next_node_id: &mut u64,
    records: &mut Vec<MutationRecord>,
    op: Op,
) -> Result<(), DomError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let text_node = node_text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(&text_node.text, offset);
            text_node.text.insert_str(offset, &text);
            if let Some(selection) = selection {
                shift_after_insert_text(selection, &path, offset, text.len());
            }
            records.push(MutationRecord {
                target: parent_id(doc, &path),
                kind: MutationKind::CharacterData,
            });
        }
        Op::RemoveText { path, range } => {
            let text_node = node_text_mut(doc, &path)?;
            let start =
                clamp_to_char_boundary(&text_node.text, range.start.min(text_node.text.len()));
            let end = clamp_to_char_boundary(&text_node.text, range.end.min(text_node.text.len()));
            if start >= end {
                return Ok(());
            }
            text_node.text.replace_range(start..end, "");
            if let Some(selection) = selection {
                shift_after_remove_text(selection, &path, start..end);
            }
            records.push(MutationRecord {
                target: parent_id(doc, &path),
                kind: MutationKind::CharacterData,
            });
        }
        Op::InsertNode { path, mut node } => {
            assign_node_ids(&mut node, next_node_id);
            insert_node(doc, &path, node)?;
            if let Some(selection) = selection {
                transform_selection_insert_node(selection, &path);
            }
            records.push(MutationRecord {
                target: parent_id(doc, &path),
                kind: MutationKind::ChildList,
            });
        }
        Op::RemoveNode { path } => {
            remove_node(doc, &path)?;
            if let Some(selection) = selection {
                transform_selection_remove_node(selection, &path);
            }
            records.push(MutationRecord {
                target: parent_id(doc, &path),
                kind: MutationKind::ChildList,
            });
        }
        Op::SetAttrs { path, patch } => {
            let Node::Element(el) = node_mut(doc, &path)? else {
                return Err(DomError::InvalidPath("Text has no attrs".into()));
            };
            for (k, v) in patch.set {
                el.attrs.insert(k, v);
            }
            for k in &patch.remove {
                el.attrs.remove(k);
            }
            let target = Some(el.id);
            records.push(MutationRecord {
                target,
                kind: MutationKind::Attributes,
            });
        }
    }
    Ok(())
}

pub(crate) fn clamp_to_char_boundary(s: &str, ix: usize) -> usize {
    (0..=ix.min(s.len()))
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

fn points_on<'a>(
    selection: &'a mut Selection,
    path: &'a [usize],
) -> impl Iterator<Item = &'a mut Point> {
    [&mut selection.anchor, &mut selection.focus]
        .into_iter()
        .filter(move |point| point.path == path)
}

fn shift_after_insert_text(selection: &mut Selection, path: &[usize], at: usize, len: usize) {
    for point in points_on(selection, path) {
        if point.offset >= at {
            point.offset += len;
        }
    }
}

/// Points inside the removed range collapse onto its start.
fn shift_after_remove_text(selection: &mut Selection, path: &[usize], removed: Range<usize>) {
    for point in points_on(selection, path) {
        point.offset = match point.offset {
            offset if offset <= removed.start => offset,
            offset if offset >= removed.end => offset - removed.len(),
            _ => removed.start,
        };
    }
}

fn transform_selection_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };
    let depth = parent_path.len();

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == parent_path {
            if point.offset > index {
                point.offset += 1;
            }
            continue;
        }
        if point.path.len() > depth && point.path.starts_with(parent_path) && point.path[depth] >= index
        {
            point.path[depth] += 1;
        }
    }
}

fn transform_selection_remove_node(selection: &mut Selection, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };
    let depth = parent_path.len();

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == parent_path {
            if point.offset > index {
                point.offset -= 1;
            }
            continue;
        }
        if point.path.len() <= depth || !point.path.starts_with(parent_path) {
            continue;
        }
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
        } else if ix == index {
            // The point sat inside the removed subtree.
            point.path.truncate(depth);
            point.offset = index;
        }
    }
}

fn parent_id(doc: &Document, path: &[usize]) -> Option<NodeId> {
    let (_, parent_path) = path.split_last()?;
    match node_ref(doc, parent_path)? {
        Node::Element(el) => Some(el.id),
        Node::Text(_) => None,
    }
}

pub(crate) fn node_ref<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = doc.children.get(*first)?;
    for &ix in rest {
        node = match node {
            Node::Element(el) => el.children.get(ix)?,
            Node::Text(_) => return None,
        };
    }
    Some(node)
}

fn node_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut Node, DomError> {
    let Some((first, rest)) = path.split_first() else {
        return Err(DomError::InvalidPath("Empty path".into()));
    };
    let len = doc.children.len();
    let mut node = doc
        .children
        .get_mut(*first)
        .ok_or_else(|| DomError::out_of_bounds(0, *first, len))?;
    for (depth, &ix) in rest.iter().enumerate() {
        node = match node {
            Node::Element(el) => {
                let len = el.children.len();
                el.children
                    .get_mut(ix)
                    .ok_or_else(|| DomError::out_of_bounds(depth + 1, ix, len))?
            }
            Node::Text(_) => return Err(DomError::NotAContainer(path[..=depth].to_vec())),
        };
    }
    Ok(node)
}

fn node_text_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut TextNode, DomError> {
    match node_mut(doc, path)? {
        Node::Text(t) => Ok(t),
        Node::Element(_) => Err(DomError::ExpectedText(path.to_vec())),
    }
}

fn children_mut<'a>(
    doc: &'a mut Document,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Node>, DomError> {
    if parent_path.is_empty() {
        return Ok(&mut doc.children);
    }
    match node_mut(doc, parent_path)? {
        Node::Element(el) => Ok(&mut el.children),
        Node::Text(_) => Err(DomError::NotAContainer(parent_path.to_vec())),
    }
}

fn insert_node(doc: &mut Document, path: &[usize], node: Node) -> Result<(), DomError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(DomError::InvalidPath("Empty insert path".into()));
    };
    let children = children_mut(doc, parent_path)?;
    if index > children.len() {
        return Err(DomError::InvalidPath(format!(
            "Insert index out of bounds: {index} > {}",
            children.len()
        )));
    }
    children.insert(index, node);
    Ok(())
}

fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Node, DomError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(DomError::InvalidPath("Empty remove path".into()));
    };
    let children = children_mut(doc, parent_path)?;
    if index >= children.len() {
        return Err(DomError::InvalidPath(format!(
            "Remove index out of bounds: {index} >= {}",
            children.len()
        )));
    }
    Ok(children.remove(index))
}
