use std::cell::Cell;
use std::rc::Rc;

use notion_blocks::{
    BlockShortcuts, BlockTag, DEFAULT_EMBED_HOST, DEFAULT_STYLE_ELEMENT_ID, FragmentParser, Key,
    KeyEvent, KeyOutcome, MarkupError, Node, Op, Point, RootId, ShortcutConfig, Surface,
    SurgeryError, TemplateParser, Transaction, find_all, render_toggle, replace_span,
};

#[test]
fn failed_transaction_changes_nothing() {
    let mut surface = Surface::from_markup(RootId(1), "<div>keep</div>").unwrap();
    surface.set_caret(Point::new(vec![0, 0], 2));
    let before = surface.doc().clone();

    let err = surface
        .apply(Transaction::new(vec![
            Op::InsertNode {
                path: vec![1],
                node: Node::plain_line(),
            },
            Op::RemoveNode { path: vec![5, 5] },
        ]))
        .unwrap_err();
    assert!(matches!(err, notion_blocks::DomError::InvalidPath(_)));

    assert_eq!(surface.doc(), &before);
    assert!(!surface.has_pending_mutations());
    assert_eq!(surface.selection().unwrap().focus, Point::new(vec![0, 0], 2));
}

#[test]
fn replace_span_keeps_text_around_the_span() {
    let mut surface = Surface::from_markup(RootId(1), "<div>one\ntwo\nthree</div>").unwrap();

    let caret = replace_span(&mut surface, &[0, 0], 4..7, "<hr>", None).unwrap();

    assert_eq!(caret, Point::new(vec![0], 2));
    assert_eq!(surface.to_markup(), "<div>one\n<hr>\nthree</div>");
    assert_eq!(surface.selection().unwrap().focus, caret);
}

#[test]
fn replace_span_rejects_bad_input_without_touching_the_tree() {
    let mut surface = Surface::from_markup(RootId(1), "<div>abc</div>").unwrap();
    let before = surface.doc().clone();

    assert_eq!(
        replace_span(&mut surface, &[0, 0], 1..9, "<hr>", None),
        Err(SurgeryError::SpanOutOfBounds { start: 1, end: 9 })
    );
    assert_eq!(
        replace_span(&mut surface, &[0], 0..1, "<hr>", None),
        Err(SurgeryError::NotText(vec![0]))
    );
    assert_eq!(
        replace_span(&mut surface, &[0, 0], 0..1, r#"<div class="open"#, None),
        Err(SurgeryError::Markup(MarkupError::UnterminatedTag(0)))
    );
    assert_eq!(surface.doc(), &before);
    assert!(!surface.has_pending_mutations());
}

struct RefusingParser;

impl FragmentParser for RefusingParser {
    fn parse_fragment(&self, _markup: &str) -> Result<Vec<Node>, MarkupError> {
        Err(MarkupError::Unsupported("no document available".into()))
    }
}

struct CountingParser(Rc<Cell<usize>>);

impl FragmentParser for CountingParser {
    fn parse_fragment(&self, markup: &str) -> Result<Vec<Node>, MarkupError> {
        self.0.set(self.0.get() + 1);
        TemplateParser.parse_fragment(markup)
    }
}

#[test]
fn refusing_host_parser_falls_back_to_template() {
    let mut surface = Surface::from_markup(RootId(2), "<div>&gt; Ideas</div>").unwrap();
    let mut shortcuts = BlockShortcuts::default().with_fragment_parser(RefusingParser);
    shortcuts.install_on(&mut surface);
    surface.set_caret(Point::new(vec![0, 0], 7));

    let outcome = shortcuts.on_key_down(&mut surface, &KeyEvent::new(Key::Space));

    assert!(outcome.prevents_default());
    assert_eq!(find_all(surface.doc(), BlockTag::Toggle).len(), 1);
}

#[test]
fn host_parser_is_preferred_when_it_works() {
    let calls = Rc::new(Cell::new(0));
    let mut surface = Surface::from_markup(RootId(2), "<div>- one</div>").unwrap();
    let mut shortcuts =
        BlockShortcuts::default().with_fragment_parser(CountingParser(calls.clone()));
    shortcuts.install_on(&mut surface);
    surface.set_caret(Point::new(vec![0, 0], 5));

    shortcuts.on_key_down(&mut surface, &KeyEvent::new(Key::Space));

    assert_eq!(calls.get(), 1);
    assert_eq!(find_all(surface.doc(), BlockTag::BulletLine).len(), 1);
}

#[test]
fn install_is_idempotent_and_injects_styles_once() {
    let mut surface = Surface::from_markup(RootId(4), "<div>x</div>").unwrap();
    let mut shortcuts = BlockShortcuts::default();

    assert!(shortcuts.install_on(&mut surface));
    assert!(!shortcuts.install_on(&mut surface));
    assert!(shortcuts.is_installed(RootId(4)));

    assert_eq!(surface.styles().len(), 1);
    assert_eq!(surface.styles()[0].id, DEFAULT_STYLE_ELEMENT_ID);
    assert!(surface.styles()[0].css.contains("details[data-notion-toggle]"));
}

#[test]
fn uninstalled_roots_are_ignored() {
    let mut surface = Surface::from_markup(RootId(8), "<div>&gt; x</div>").unwrap();
    let shortcuts = BlockShortcuts::default();
    surface.set_caret(Point::new(vec![0, 0], 3));
    let before = surface.doc().clone();

    assert_eq!(
        shortcuts.on_key_down(&mut surface, &KeyEvent::new(Key::Space)),
        KeyOutcome::Ignored
    );
    assert_eq!(surface.doc(), &before);
}

#[test]
fn key_up_never_acts() {
    let mut surface = Surface::from_markup(RootId(8), "<div>&gt; x</div>").unwrap();
    let mut shortcuts = BlockShortcuts::default();
    shortcuts.install_on(&mut surface);
    surface.set_caret(Point::new(vec![0, 0], 3));

    assert_eq!(
        shortcuts.on_key_up(&mut surface, &KeyEvent::new(Key::Space)),
        KeyOutcome::Ignored
    );
}

#[test]
fn dom_key_names_map_to_keys() {
    assert_eq!(Key::from_dom_key(" "), Key::Space);
    assert_eq!(Key::from_dom_key("Enter"), Key::Enter);
    assert_eq!(Key::from_dom_key("Backspace"), Key::Backspace);
    assert_eq!(Key::from_dom_key("a"), Key::Other("a".into()));
}

#[test]
fn config_defaults_and_overrides() -> anyhow::Result<()> {
    let config = ShortcutConfig::from_json_str("{}")?;
    assert_eq!(config, ShortcutConfig::default());
    assert_eq!(config.embed_host, DEFAULT_EMBED_HOST);
    assert!(config.toggle_open_by_default);

    let config = ShortcutConfig::from_json_str(
        r#"{ "embed_host": "  ", "style_element_id": "mine", "toggle_open_by_default": false }"#,
    )?;
    assert_eq!(config.embed_host, DEFAULT_EMBED_HOST);
    assert_eq!(config.style_element_id, "mine");
    assert!(!config.toggle_open_by_default);

    let reparsed = ShortcutConfig::from_json_str(&config.to_json_pretty()?)?;
    assert_eq!(reparsed, config);
    Ok(())
}

#[test]
fn closed_by_default_config_renders_closed_toggles() {
    let config = ShortcutConfig {
        toggle_open_by_default: false,
        ..ShortcutConfig::default()
    };
    let mut surface = Surface::from_markup(RootId(6), "<div>&gt; shut</div>").unwrap();
    let mut shortcuts = BlockShortcuts::new(config);
    shortcuts.install_on(&mut surface);
    surface.set_caret(Point::new(vec![0, 0], 6));

    shortcuts.on_key_down(&mut surface, &KeyEvent::new(Key::Space));

    let toggle = find_all(surface.doc(), BlockTag::Toggle).pop().unwrap();
    let toggle = notion_blocks::element_at(surface.doc(), &toggle).unwrap();
    assert!(!toggle.has_attr("open"));
}

#[test]
fn serialized_surface_parses_back_to_the_same_tree() {
    let markup = format!(
        "<div>intro &amp; more</div>{}<div>tail</div>",
        render_toggle("a < b", true)
    );
    let surface = Surface::from_markup(RootId(1), &markup).unwrap();
    let again = Surface::from_markup(RootId(1), &surface.to_markup()).unwrap();
    assert_eq!(again.doc(), surface.doc());
}
