//! Markup handling for block insertion: escaping user text, turning rendered
//! markup into detached nodes, and serializing a tree back to markup.

use crate::dom::{Attrs, ElementNode, Node, TextNode};
use crate::error::MarkupError;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Turns markup into a detached node fragment. Hosts that own a native
/// fragment parser implement this; [`TemplateParser`] is the built-in one.
pub trait FragmentParser {
    fn parse_fragment(&self, markup: &str) -> Result<Vec<Node>, MarkupError>;
}

/// Parses markup the way a detached `<template>` element would: lenient about
/// unbalanced end tags, strict about tags that never close.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParser;

impl FragmentParser for TemplateParser {
    fn parse_fragment(&self, markup: &str) -> Result<Vec<Node>, MarkupError> {
        let mut builder = FragmentBuilder::default();
        let bytes = markup.as_bytes();
        let mut ix = 0usize;

        while ix < markup.len() {
            let rest = &markup[ix..];
            if rest.starts_with("<!--") {
                let Some(end) = rest[4..].find("-->") else {
                    return Err(MarkupError::UnterminatedComment(ix));
                };
                ix += 4 + end + 3;
            } else if rest.starts_with("</") {
                let Some(end) = rest.find('>') else {
                    return Err(MarkupError::UnterminatedTag(ix));
                };
                let name = rest[2..end].trim().to_ascii_lowercase();
                builder.close(&name);
                ix += end + 1;
            } else if rest.starts_with('<') && bytes.get(ix + 1).is_some_and(u8::is_ascii_alphabetic)
            {
                let tag = parse_start_tag(markup, ix)?;
                ix = tag.end;
                if tag.self_closing || VOID_TAGS.contains(&tag.element.tag.as_str()) {
                    builder.push(Node::Element(tag.element));
                } else if RAW_TEXT_TAGS.contains(&tag.element.tag.as_str()) {
                    let close = format!("</{}", tag.element.tag);
                    let body_end = markup[ix..]
                        .to_ascii_lowercase()
                        .find(&close)
                        .map_or(markup.len(), |pos| ix + pos);
                    let mut element = tag.element;
                    if body_end > ix {
                        element.children.push(Node::text(&markup[ix..body_end]));
                    }
                    builder.push(Node::Element(element));
                    ix = markup[body_end..]
                        .find('>')
                        .map_or(markup.len(), |pos| body_end + pos + 1);
                } else {
                    builder.open(tag.element);
                }
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let next = rest[first..]
                    .find('<')
                    .map_or(markup.len(), |pos| ix + first + pos);
                builder.text(&markup[ix..next]);
                ix = next;
            }
        }

        Ok(builder.finish())
    }
}

#[derive(Default)]
struct FragmentBuilder {
    roots: Vec<Node>,
    open: Vec<ElementNode>,
}

impl FragmentBuilder {
    fn push(&mut self, node: Node) {
        let children = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        if let (Node::Text(incoming), Some(Node::Text(prev))) = (&node, children.last_mut()) {
            prev.text.push_str(&incoming.text);
            return;
        }
        children.push(node);
    }

    fn text(&mut self, raw: &str) {
        // Indentation between tags is layout, not content.
        if raw.contains('\n') && raw.trim().is_empty() {
            return;
        }
        self.push(Node::Text(TextNode {
            text: decode_entities(raw),
        }));
    }

    fn open(&mut self, element: ElementNode) {
        self.open.push(element);
    }

    fn close(&mut self, tag: &str) {
        if !self.open.iter().any(|el| el.tag == tag) {
            return;
        }
        while let Some(element) = self.open.pop() {
            let done = element.tag == tag;
            self.push(Node::Element(element));
            if done {
                break;
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(element) = self.open.pop() {
            self.push(Node::Element(element));
        }
        self.roots
    }
}

struct StartTag {
    element: ElementNode,
    self_closing: bool,
    end: usize,
}

fn parse_start_tag(markup: &str, start: usize) -> Result<StartTag, MarkupError> {
    let bytes = markup.as_bytes();
    let mut ix = start + 1;
    while ix < bytes.len() && (bytes[ix].is_ascii_alphanumeric() || bytes[ix] == b'-') {
        ix += 1;
    }
    if ix == start + 1 {
        return Err(MarkupError::InvalidTagName(start));
    }
    let mut element = ElementNode::new(markup[start + 1..ix].to_ascii_lowercase());
    let mut attrs = Attrs::default();

    loop {
        while ix < bytes.len() && bytes[ix].is_ascii_whitespace() {
            ix += 1;
        }
        match bytes.get(ix) {
            None => return Err(MarkupError::UnterminatedTag(start)),
            Some(b'>') => {
                element.attrs = attrs;
                return Ok(StartTag {
                    element,
                    self_closing: false,
                    end: ix + 1,
                });
            }
            Some(b'/') if bytes.get(ix + 1) == Some(&b'>') => {
                element.attrs = attrs;
                return Ok(StartTag {
                    element,
                    self_closing: true,
                    end: ix + 2,
                });
            }
            Some(b'/') => {
                ix += 1;
                continue;
            }
            Some(_) => {}
        }

        let name_start = ix;
        while ix < bytes.len()
            && !bytes[ix].is_ascii_whitespace()
            && !matches!(bytes[ix], b'=' | b'>' | b'/')
        {
            ix += 1;
        }
        let name = markup[name_start..ix].to_ascii_lowercase();

        while ix < bytes.len() && bytes[ix].is_ascii_whitespace() {
            ix += 1;
        }
        if bytes.get(ix) != Some(&b'=') {
            attrs.entry(name).or_default();
            continue;
        }
        ix += 1;
        while ix < bytes.len() && bytes[ix].is_ascii_whitespace() {
            ix += 1;
        }

        let value = match bytes.get(ix) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = ix + 1;
                let Some(len) = markup[value_start..].find(quote as char) else {
                    return Err(MarkupError::UnterminatedTag(start));
                };
                ix = value_start + len + 1;
                &markup[value_start..value_start + len]
            }
            Some(_) => {
                let value_start = ix;
                while ix < bytes.len() && !bytes[ix].is_ascii_whitespace() && bytes[ix] != b'>' {
                    ix += 1;
                }
                &markup[value_start..ix]
            }
            None => return Err(MarkupError::UnterminatedTag(start)),
        };
        attrs.entry(name).or_insert_with(|| decode_entities(value));
    }
}

/// Escapes the five characters that are significant in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            decode_entity(entity).map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{A0}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

pub fn to_markup(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => escape_text_into(&t.text, out),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                for ch in value.chars() {
                    match ch {
                        '&' => out.push_str("&amp;"),
                        '"' => out.push_str("&quot;"),
                        _ => out.push(ch),
                    }
                }
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&el.tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_TAGS.contains(&el.tag.as_str());
            for child in &el.children {
                match child {
                    Node::Text(t) if raw => out.push_str(&t.text),
                    _ => write_node(child, out),
                }
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
