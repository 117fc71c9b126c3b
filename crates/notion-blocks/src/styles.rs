use crate::config::ShortcutConfig;
use crate::dom::{StyleBlock, Surface};

pub const BLOCK_CSS: &str = r#"
details[data-notion-toggle] summary::-webkit-details-marker { display: none; }
details[data-notion-toggle] summary {
    list-style: none;
    display: flex;
    align-items: center;
    gap: 0.35em;
    font-size: 0.95em;
    cursor: text;
    padding: 2px 0;
}
details[data-notion-toggle] summary::before {
    content: "▸";
    display: inline-block;
    width: 1em;
    text-align: center;
    font-size: 0.85em;
    cursor: pointer;
}
details[data-notion-toggle][open] summary::before { content: "▾"; }
details[data-notion-toggle] [data-notion-toggle-body] {
    margin: 4px 0;
    padding: 4px 6px 4px 1.15em;
    display: flex;
    flex-direction: column;
    gap: 0.25em;
    min-height: 1.4em;
}
details[data-notion-toggle] [data-notion-toggle-line] { min-height: 1.2em; padding: 2px 0; }
div[data-notion-bullet], div[data-notion-ordered] { margin: 0.2em 0; }
div[data-notion-bullet] ul, div[data-notion-ordered] ol { margin: 0 0 0 1.5em; padding-left: 0; }
[data-notion-heading="1"] { font-size: 1.6em; font-weight: 700; margin: 0.6em 0 0.3em; line-height: 1.3; }
[data-notion-heading="2"] { font-size: 1.35em; font-weight: 600; margin: 0.5em 0 0.25em; line-height: 1.35; }
[data-notion-heading="3"] { font-size: 1.15em; font-weight: 600; margin: 0.4em 0 0.2em; line-height: 1.4; }
[data-notion-heading] + div, [data-notion-heading] + p { margin-top: 0.25em; }
"#;

/// Adds the block stylesheet to the surface unless a block with the
/// configured id is already there. Returns whether it was added.
pub fn inject_styles(surface: &mut Surface, config: &ShortcutConfig) -> bool {
    if surface
        .styles()
        .iter()
        .any(|style| style.id == config.style_element_id)
    {
        return false;
    }
    surface.styles_mut().push(StyleBlock {
        id: config.style_element_id.clone(),
        css: BLOCK_CSS.to_string(),
    });
    tracing::debug!(id = %config.style_element_id, "injected block styles");
    true
}
