use serde::{Deserialize, Serialize};

use crate::dom::{ElementNode, Node};

/// Discriminant attributes attached to every rendered block part. Lookups go
/// through these tags instead of guessing from tag names or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTag {
    Toggle,
    ToggleSummary,
    ToggleBody,
    ToggleLine,
    Bullet,
    BulletLine,
    Ordered,
    OrderedLine,
    Heading,
    BeforeVideo,
    Video,
    AfterVideo,
}

impl BlockTag {
    pub fn attr(self) -> &'static str {
        match self {
            BlockTag::Toggle => "data-notion-toggle",
            BlockTag::ToggleSummary => "data-notion-toggle-summary",
            BlockTag::ToggleBody => "data-notion-toggle-body",
            BlockTag::ToggleLine => "data-notion-toggle-line",
            BlockTag::Bullet => "data-notion-bullet",
            BlockTag::BulletLine => "data-notion-bullet-line",
            BlockTag::Ordered => "data-notion-ordered",
            BlockTag::OrderedLine => "data-notion-ordered-line",
            BlockTag::Heading => "data-notion-heading",
            BlockTag::BeforeVideo => "data-notion-before-youtube",
            BlockTag::Video => "data-notion-youtube",
            BlockTag::AfterVideo => "data-notion-after-youtube",
        }
    }
}

impl ElementNode {
    pub fn is(&self, tag: BlockTag) -> bool {
        self.has_attr(tag.attr())
    }

    pub fn tagged(self, tag: BlockTag) -> Self {
        self.with_attr(tag.attr(), "1")
    }
}

impl Node {
    pub fn is(&self, tag: BlockTag) -> bool {
        self.as_element().is_some_and(|el| el.is(tag))
    }

    /// An empty `div[data-notion-toggle-line]` holding a `<br>` so it keeps
    /// its height and can take the caret.
    pub fn toggle_line() -> Self {
        Node::Element(
            ElementNode::new("div")
                .tagged(BlockTag::ToggleLine)
                .with_child(Node::line_break()),
        )
    }
}
