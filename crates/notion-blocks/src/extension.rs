use std::collections::HashSet;

use crate::config::ShortcutConfig;
use crate::dispatch::{KeyEvent, KeyOutcome, dispatch_key_down};
use crate::dom::{RootId, Surface};
use crate::guard;
use crate::markup::FragmentParser;
use crate::styles::inject_styles;

/// Entry point for a host editor. One instance serves any number of
/// editable roots; each must be installed before its keys are handled.
pub struct BlockShortcuts {
    config: ShortcutConfig,
    installed: HashSet<RootId>,
    fragment_parser: Option<Box<dyn FragmentParser>>,
}

impl Default for BlockShortcuts {
    fn default() -> Self {
        Self::new(ShortcutConfig::default())
    }
}

impl BlockShortcuts {
    pub fn new(config: ShortcutConfig) -> Self {
        Self {
            config,
            installed: HashSet::new(),
            fragment_parser: None,
        }
    }

    /// Uses the host's own HTML parser for inserted fragments. The template
    /// parser stays as the fallback.
    pub fn with_fragment_parser(mut self, parser: impl FragmentParser + 'static) -> Self {
        self.fragment_parser = Some(Box::new(parser));
        self
    }

    pub fn config(&self) -> &ShortcutConfig {
        &self.config
    }

    /// Attaches to `surface`. Styles are (re)checked on every call; the rest
    /// happens once per root. Returns whether this call installed the root.
    pub fn install_on(&mut self, surface: &mut Surface) -> bool {
        inject_styles(surface, &self.config);
        if !self.installed.insert(surface.id()) {
            return false;
        }
        guard::observe_all(surface);
        tracing::debug!(root = surface.id().0, "block shortcuts installed");
        true
    }

    pub fn is_installed(&self, root: RootId) -> bool {
        self.installed.contains(&root)
    }

    pub fn on_key_down(&self, surface: &mut Surface, event: &KeyEvent) -> KeyOutcome {
        if !self.is_installed(surface.id()) {
            return KeyOutcome::Ignored;
        }
        dispatch_key_down(
            surface,
            event,
            &self.config,
            self.fragment_parser.as_deref(),
        )
    }

    /// Key-up carries no behavior.
    pub fn on_key_up(&self, _surface: &mut Surface, _event: &KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }

    /// Runs the toggle-body guard over the mutations queued since the last
    /// delivery. Returns how many empty bodies got a line back.
    pub fn deliver_mutations(&self, surface: &mut Surface) -> usize {
        if !self.is_installed(surface.id()) {
            return 0;
        }
        let restored = guard::deliver_mutations(surface);
        guard::disconnect_detached(surface);
        restored
    }
}
