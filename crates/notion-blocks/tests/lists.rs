use notion_blocks::{
    Action, BlockShortcuts, BlockTag, Key, KeyEvent, KeyOutcome, Point, RootId, Surface,
    Transition, convert_list_line, find_all, render_toggle,
};

fn installed(markup: &str) -> (BlockShortcuts, Surface) {
    let mut surface = Surface::from_markup(RootId(3), markup).unwrap();
    let mut shortcuts = BlockShortcuts::default();
    shortcuts.install_on(&mut surface);
    (shortcuts, surface)
}

fn backspace(shortcuts: &BlockShortcuts, surface: &mut Surface) -> KeyOutcome {
    shortcuts.on_key_down(surface, &KeyEvent::new(Key::Backspace))
}

const BULLETS: &str = concat!(
    r#"<div data-notion-bullet="1"><ul>"#,
    r#"<li data-notion-bullet-line="1">A</li>"#,
    r#"<li data-notion-bullet-line="1">B</li>"#,
    r#"<li data-notion-bullet-line="1">C</li>"#,
    r#"</ul></div>"#,
);

const NUMBERS: &str = concat!(
    r#"<div data-notion-ordered="1"><ol>"#,
    r#"<li data-notion-ordered-line="1">A</li>"#,
    r#"<li data-notion-ordered-line="1">B</li>"#,
    r#"<li data-notion-ordered-line="1">C</li>"#,
    r#"</ol></div>"#,
);

#[test]
fn backspace_at_middle_bullet_splits_list_around_plain_line() {
    let (shortcuts, mut surface) = installed(BULLETS);
    surface.set_caret(Point::new(vec![0, 0, 1, 0], 0));

    let outcome = backspace(&shortcuts, &mut surface);
    assert_eq!(
        outcome,
        KeyOutcome::Handled(Action::Transition {
            transition: Transition::ListLineToPlainLine
        })
    );
    assert_eq!(
        surface.to_markup(),
        concat!(
            r#"<div data-notion-bullet="1"><ul><li data-notion-bullet-line="1">A</li></ul></div>"#,
            r#"<div data-notion-toggle-line="1">B</div>"#,
            r#"<div data-notion-bullet="1"><ul><li data-notion-bullet-line="1">C</li></ul></div>"#,
        )
    );
    assert_eq!(surface.selection().unwrap().focus, Point::new(vec![1, 0], 0));
}

#[test]
fn ordered_continuation_keeps_counting() {
    let (shortcuts, mut surface) = installed(NUMBERS);
    surface.set_caret(Point::new(vec![0, 0, 1, 0], 0));

    backspace(&shortcuts, &mut surface);

    assert_eq!(
        surface.to_markup(),
        concat!(
            r#"<div data-notion-ordered="1"><ol><li data-notion-ordered-line="1">A</li></ol></div>"#,
            r#"<div data-notion-toggle-line="1">B</div>"#,
            r#"<div data-notion-ordered="1"><ol start="3"><li data-notion-ordered-line="1">C</li></ol></div>"#,
        )
    );
}

#[test]
fn ordered_continuation_counts_from_existing_start() {
    let markup = NUMBERS.replace("<ol>", r#"<ol start="5">"#);
    let (shortcuts, mut surface) = installed(&markup);
    surface.set_caret(Point::new(vec![0, 0, 1, 0], 0));

    backspace(&shortcuts, &mut surface);

    let Some(notion_blocks::Node::Element(wrapper)) = surface.doc().children.get(2) else {
        panic!("expected continuation wrapper");
    };
    let notion_blocks::Node::Element(list) = &wrapper.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.attr("start"), Some("7"));
}

#[test]
fn first_item_of_single_item_list_replaces_wrapper() {
    let markup = r#"<div data-notion-bullet="1"><ul><li data-notion-bullet-line="1">only</li></ul></div>"#;
    let (shortcuts, mut surface) = installed(markup);
    surface.set_caret(Point::new(vec![0, 0, 0, 0], 0));

    backspace(&shortcuts, &mut surface);

    assert_eq!(
        surface.to_markup(),
        r#"<div data-notion-toggle-line="1">only</div>"#
    );
    assert_eq!(surface.selection().unwrap().focus, Point::new(vec![0, 0], 0));
}

#[test]
fn first_item_with_followers_moves_them_below() {
    let (shortcuts, mut surface) = installed(BULLETS);
    surface.set_caret(Point::new(vec![0, 0, 0, 0], 0));

    backspace(&shortcuts, &mut surface);

    assert_eq!(
        surface.to_markup(),
        concat!(
            r#"<div data-notion-toggle-line="1">A</div>"#,
            r#"<div data-notion-bullet="1"><ul>"#,
            r#"<li data-notion-bullet-line="1">B</li>"#,
            r#"<li data-notion-bullet-line="1">C</li>"#,
            r#"</ul></div>"#,
        )
    );
}

#[test]
fn empty_item_gets_placeholder_break() {
    let markup = r#"<div data-notion-bullet="1"><ul><li data-notion-bullet-line="1"><br></li></ul></div>"#;
    let (shortcuts, mut surface) = installed(markup);
    surface.set_caret(Point::new(vec![0, 0, 0], 0));

    backspace(&shortcuts, &mut surface);

    assert_eq!(
        surface.to_markup(),
        r#"<div data-notion-toggle-line="1"><br></div>"#
    );
    assert_eq!(surface.selection().unwrap().focus, Point::new(vec![0], 0));
}

#[test]
fn backspace_after_item_text_is_left_to_the_host() {
    let (shortcuts, mut surface) = installed(BULLETS);
    surface.set_caret(Point::new(vec![0, 0, 1, 0], 1));

    assert_eq!(backspace(&shortcuts, &mut surface), KeyOutcome::Ignored);
    assert_eq!(find_all(surface.doc(), BlockTag::BulletLine).len(), 3);
}

#[test]
fn list_inside_toggle_body_becomes_body_line() {
    let markup = concat!(
        r#"<details data-notion-toggle="1" open><summary data-notion-toggle-summary="1">&#8203;Plan</summary>"#,
        r#"<div data-notion-toggle-body="">"#,
        r#"<div data-notion-toggle-line="1">intro</div>"#,
        r#"<div data-notion-bullet="1"><ul><li data-notion-bullet-line="1">step</li></ul></div>"#,
        r#"</div></details>"#,
    );
    let (shortcuts, mut surface) = installed(markup);
    surface.set_caret(Point::new(vec![0, 1, 1, 0, 0, 0], 0));

    backspace(&shortcuts, &mut surface);

    let lines = find_all(surface.doc(), BlockTag::ToggleLine);
    assert_eq!(lines, vec![vec![0, 1, 0], vec![0, 1, 1]]);
    assert!(find_all(surface.doc(), BlockTag::Bullet).is_empty());
}

#[test]
fn convert_list_line_reports_new_line_path() {
    let mut surface = Surface::from_markup(RootId(9), NUMBERS).unwrap();
    let line = convert_list_line(&mut surface, &[0, 0, 2]).unwrap();
    assert_eq!(line, vec![1]);
    assert_eq!(find_all(surface.doc(), BlockTag::OrderedLine).len(), 2);
}

#[test]
fn backspace_at_first_body_line_returns_to_summary_start() {
    let (shortcuts, mut surface) = installed(&render_toggle("Plan", true));
    surface.set_caret(Point::new(vec![0, 1, 0], 0));

    let outcome = backspace(&shortcuts, &mut surface);
    assert_eq!(
        outcome,
        KeyOutcome::Handled(Action::Transition {
            transition: Transition::BodyStartToSummary
        })
    );
    // The toggle and its line stay.
    assert_eq!(find_all(surface.doc(), BlockTag::ToggleLine).len(), 1);
    assert_eq!(
        surface.selection().unwrap().focus,
        Point::new(vec![0, 0, 0], '\u{200B}'.len_utf8())
    );
}

#[test]
fn backspace_at_second_body_line_is_left_to_the_host() {
    let markup = concat!(
        r#"<details data-notion-toggle="1" open><summary data-notion-toggle-summary="1">&#8203;Plan</summary>"#,
        r#"<div data-notion-toggle-body="">"#,
        r#"<div data-notion-toggle-line="1">one</div>"#,
        r#"<div data-notion-toggle-line="1">two</div>"#,
        r#"</div></details>"#,
    );
    let (shortcuts, mut surface) = installed(markup);
    surface.set_caret(Point::new(vec![0, 1, 1, 0], 0));

    assert_eq!(backspace(&shortcuts, &mut surface), KeyOutcome::Ignored);
}
