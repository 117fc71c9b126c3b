use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::dom::clamp_to_char_boundary;

/// The key whose press asked for recognition. With Space the space has not
/// been inserted yet, which matters for the heading look-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKey {
    Space,
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentKind {
    Toggle,
    Heading { level: u8 },
    Bullet,
    Ordered,
    Video { video_id: String },
}

/// A line classified by its leading marker. `start..end` is the line's byte
/// span inside its text node and never contains a newline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIntent {
    pub kind: IntentKind,
    pub start: usize,
    pub end: usize,
    pub content: String,
}

impl LineIntent {
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

pub fn recognize(text: &str, cursor: usize, trigger: TriggerKey) -> Option<LineIntent> {
    if text.is_empty() {
        return None;
    }
    let cursor = clamp_to_char_boundary(text, cursor);
    let line = line_bounds(text, cursor);
    let marker_ix = skip_spaces(text, line.start);
    let marker = text[marker_ix..].chars().next()?;
    if marker == '\n' {
        return None;
    }

    let intent = |kind: IntentKind, content_start: usize| LineIntent {
        kind,
        start: line.start,
        end: line.end,
        content: text[content_start.min(line.end)..line.end].trim().to_string(),
    };

    match marker {
        '>' => Some(intent(IntentKind::Toggle, skip_spaces(text, marker_ix + 1))),
        '#' => {
            let bytes = text.as_bytes();
            let mut level = 1u8;
            let mut ix = marker_ix + 1;
            while ix < bytes.len() && bytes[ix] == b'#' && level < 3 {
                level += 1;
                ix += 1;
            }
            if bytes.get(ix) == Some(&b'#') {
                return None;
            }
            let has_actual_space = bytes.get(ix) == Some(&b' ');
            let pending_space = trigger == TriggerKey::Space && ix == cursor;
            if !has_actual_space && !pending_space {
                return None;
            }
            Some(intent(IntentKind::Heading { level }, skip_spaces(text, ix)))
        }
        '-' => Some(intent(IntentKind::Bullet, skip_spaces(text, marker_ix + 1))),
        '1' if text[marker_ix + 1..].starts_with('.') => {
            let after = marker_ix + 2;
            if text[after..].chars().next().is_some_and(|ch| !ch.is_whitespace()) {
                return None;
            }
            Some(intent(IntentKind::Ordered, skip_spaces(text, after)))
        }
        _ => {
            let video_id = youtube_video_id(&text[marker_ix..line.end])?;
            Some(LineIntent {
                kind: IntentKind::Video {
                    video_id: video_id.to_string(),
                },
                start: line.start,
                end: line.end,
                content: String::new(),
            })
        }
    }
}

/// Byte span of the physical line holding `cursor`, without its newline.
pub fn line_bounds(text: &str, cursor: usize) -> Range<usize> {
    let cursor = clamp_to_char_boundary(text, cursor);
    let start = text[..cursor].rfind('\n').map_or(0, |ix| ix + 1);
    let end = text[cursor..].find('\n').map_or(text.len(), |ix| cursor + ix);
    start..end
}

fn skip_spaces(text: &str, from: usize) -> usize {
    let from = from.min(text.len());
    text[from..]
        .char_indices()
        .find(|&(_, ch)| !ch.is_whitespace() || ch == '\n')
        .map_or(text.len(), |(ix, _)| from + ix)
}

/// Matches `http(s)://[www.]youtube.com/watch?v=<id>` or
/// `http(s)://[www.]youtu.be/<id>` at the start of `line`.
pub fn youtube_video_id(line: &str) -> Option<&str> {
    fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
        let head = s.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
    }

    let rest = strip_prefix_ignore_case(line, "https://")
        .or_else(|| strip_prefix_ignore_case(line, "http://"))?;
    let rest = strip_prefix_ignore_case(rest, "www.").unwrap_or(rest);
    let rest = strip_prefix_ignore_case(rest, "youtube.com/watch?v=")
        .or_else(|| strip_prefix_ignore_case(rest, "youtu.be/"))?;

    let len = rest
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'))
        .unwrap_or(rest.len());
    (len > 0).then(|| &rest[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str, cursor: usize, trigger: TriggerKey) -> Option<IntentKind> {
        recognize(text, cursor, trigger).map(|intent| intent.kind)
    }

    #[test]
    fn toggle_takes_trimmed_remainder() {
        let intent = recognize(">   Foo bar  ", 13, TriggerKey::Enter).unwrap();
        assert_eq!(intent.kind, IntentKind::Toggle);
        assert_eq!(intent.content, "Foo bar");
        assert_eq!(intent.span(), 0..13);
    }

    #[test]
    fn span_is_limited_to_the_cursor_line() {
        let text = "first\n  > second\nthird";
        let intent = recognize(text, 16, TriggerKey::Space).unwrap();
        assert_eq!(intent.span(), 6..16);
        assert_eq!(intent.content, "second");
        assert!(recognize(text, 3, TriggerKey::Space).is_none());
    }

    #[test]
    fn heading_needs_a_space_or_pending_space() {
        assert_eq!(
            kind("#", 1, TriggerKey::Space),
            Some(IntentKind::Heading { level: 1 })
        );
        assert_eq!(kind("#", 1, TriggerKey::Enter), None);
        assert_eq!(
            kind("## Title", 8, TriggerKey::Enter),
            Some(IntentKind::Heading { level: 2 })
        );
        assert_eq!(
            kind("###", 3, TriggerKey::Space),
            Some(IntentKind::Heading { level: 3 })
        );
        assert_eq!(kind("#x", 2, TriggerKey::Space), None);
        assert_eq!(kind("#### text", 9, TriggerKey::Space), None);
        assert_eq!(kind("#### text", 9, TriggerKey::Enter), None);
    }

    #[test]
    fn pending_space_requires_cursor_right_after_hashes() {
        assert_eq!(kind("##", 1, TriggerKey::Space), None);
    }

    #[test]
    fn bullet_and_ordered_markers() {
        assert_eq!(kind("- ", 2, TriggerKey::Space), Some(IntentKind::Bullet));
        assert_eq!(kind("-item", 5, TriggerKey::Enter), Some(IntentKind::Bullet));
        assert_eq!(kind("1.", 2, TriggerKey::Space), Some(IntentKind::Ordered));
        assert_eq!(kind("1. one", 6, TriggerKey::Enter), Some(IntentKind::Ordered));
        assert_eq!(kind("1.x", 3, TriggerKey::Space), None);
        assert_eq!(kind("2. two", 6, TriggerKey::Space), None);
    }

    #[test]
    fn youtube_urls_yield_video_ids() {
        let intent = recognize("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1", 10, TriggerKey::Enter)
            .unwrap();
        assert_eq!(
            intent.kind,
            IntentKind::Video {
                video_id: "dQw4w9WgXcQ".to_string()
            }
        );
        assert_eq!(youtube_video_id("HTTP://youtu.be/a-b_c"), Some("a-b_c"));
        assert_eq!(youtube_video_id("https://youtu.be/"), None);
        assert_eq!(youtube_video_id("https://vimeo.com/1"), None);
    }

    #[test]
    fn blank_lines_never_match() {
        assert_eq!(kind("", 0, TriggerKey::Space), None);
        assert_eq!(kind("   ", 3, TriggerKey::Space), None);
        assert_eq!(kind("a\n\nb", 2, TriggerKey::Enter), None);
        assert_eq!(kind("plain text", 10, TriggerKey::Space), None);
    }
}
