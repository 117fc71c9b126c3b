use serde::{Deserialize, Serialize};

use crate::block::BlockTag;
use crate::caret::focus_after_insert;
use crate::config::ShortcutConfig;
use crate::dom::{Node, Surface};
use crate::grammar::{IntentKind, TriggerKey, recognize};
use crate::markup::FragmentParser;
use crate::query::{ancestor_with, caret_text_position, node_at};
use crate::render::render;
use crate::surgeon::replace_span;
use crate::transitions::{
    Transition, backspace_at_line_start, backspace_at_summary_start, enter_on_summary, flip_open,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Backspace,
    Enter,
    Space,
    Other(String),
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Backspace" => Key::Backspace,
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            other => Key::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            alt: false,
            ctrl: false,
            shift: false,
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Shortcut { kind: IntentKind },
    Transition { transition: Transition },
}

/// What a key-down did. `Handled` means the host must suppress its default
/// behavior and stop propagating the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyOutcome {
    Ignored,
    Handled(Action),
}

impl KeyOutcome {
    pub fn prevents_default(&self) -> bool {
        matches!(self, KeyOutcome::Handled(_))
    }

    pub fn action(&self) -> Option<&Action> {
        match self {
            KeyOutcome::Handled(action) => Some(action),
            KeyOutcome::Ignored => None,
        }
    }

    fn transition(transition: Transition) -> Self {
        tracing::debug!(?transition, "key handled by transition");
        KeyOutcome::Handled(Action::Transition { transition })
    }
}

/// Routes a key-down through the handlers in priority order: Alt+Enter,
/// Backspace transitions, then (without Ctrl) Enter on a summary and the
/// line shortcuts.
pub fn dispatch_key_down(
    surface: &mut Surface,
    event: &KeyEvent,
    config: &ShortcutConfig,
    parser: Option<&dyn FragmentParser>,
) -> KeyOutcome {
    if event.alt && event.key == Key::Enter {
        return flip_open(surface).map_or(KeyOutcome::Ignored, KeyOutcome::transition);
    }

    if event.key == Key::Backspace {
        let handled = backspace_at_line_start(surface).or_else(|| backspace_at_summary_start(surface));
        return handled.map_or(KeyOutcome::Ignored, KeyOutcome::transition);
    }

    if event.ctrl {
        return KeyOutcome::Ignored;
    }

    let trigger = match event.key {
        Key::Enter => {
            if let Some(transition) = enter_on_summary(surface) {
                return KeyOutcome::transition(transition);
            }
            TriggerKey::Enter
        }
        Key::Space => TriggerKey::Space,
        _ => return KeyOutcome::Ignored,
    };

    match replace_line(surface, trigger, config, parser) {
        Some(kind) => {
            tracing::debug!(?kind, "line converted by shortcut");
            KeyOutcome::Handled(Action::Shortcut { kind })
        }
        None => KeyOutcome::Ignored,
    }
}

/// Recognizes the caret's line and swaps it for the rendered block. Returns
/// `None` without touching anything when the line carries no marker.
pub fn replace_line(
    surface: &mut Surface,
    trigger: TriggerKey,
    config: &ShortcutConfig,
    parser: Option<&dyn FragmentParser>,
) -> Option<IntentKind> {
    let selection = surface.selection()?;
    if !selection.is_collapsed() {
        return None;
    }
    let caret = selection.focus.clone();
    let doc = surface.doc();
    if ancestor_with(doc, &caret.path, BlockTag::Heading).is_some() {
        tracing::trace!("caret inside a heading, shortcuts disabled");
        return None;
    }

    let (text_path, offset) = caret_text_position(doc, &caret)?;
    let Some(Node::Text(text)) = node_at(doc, &text_path) else {
        return None;
    };
    let Some(intent) = recognize(&text.text, offset, trigger) else {
        tracing::trace!(?trigger, "no shortcut marker on line");
        return None;
    };

    let markup = render(&intent, config);
    let inserted_end = match replace_span(surface, &text_path, intent.span(), &markup, parser) {
        Ok(point) => point,
        Err(err) => {
            tracing::warn!(%err, "failed to replace line with block");
            return None;
        }
    };
    focus_after_insert(surface, &intent, &inserted_end);
    Some(intent.kind)
}
