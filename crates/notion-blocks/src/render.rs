use crate::block::BlockTag;
use crate::config::ShortcutConfig;
use crate::grammar::{IntentKind, LineIntent};
use crate::markup::escape_html;

const ZWSP_ENTITY: &str = "&#8203;";

pub fn render(intent: &LineIntent, config: &ShortcutConfig) -> String {
    match &intent.kind {
        IntentKind::Toggle => render_toggle(&intent.content, config.toggle_open_by_default),
        IntentKind::Heading { level } => render_heading(*level, &intent.content),
        IntentKind::Bullet => render_list_item(BlockTag::Bullet, &intent.content),
        IntentKind::Ordered => render_list_item(BlockTag::Ordered, &intent.content),
        IntentKind::Video { video_id } => render_video(video_id, &config.embed_host),
    }
}

/// The summary always leads with a zero-width space so an empty summary
/// keeps a text node to hold the caret.
pub fn render_toggle(summary: &str, open: bool) -> String {
    format!(
        r#"<details {toggle}="1"{open}><summary {summary_tag}="1">{ZWSP_ENTITY}{summary}</summary><div {body}=""><div {line}="1"><br></div></div></details>"#,
        toggle = BlockTag::Toggle.attr(),
        open = if open { " open" } else { "" },
        summary_tag = BlockTag::ToggleSummary.attr(),
        summary = escape_html(summary),
        body = BlockTag::ToggleBody.attr(),
        line = BlockTag::ToggleLine.attr(),
    )
}

pub fn render_heading(level: u8, content: &str) -> String {
    let level = level.clamp(1, 3);
    let content = if content.is_empty() {
        ZWSP_ENTITY.to_string()
    } else {
        escape_html(content)
    };
    format!(
        r#"<h{level} {attr}="{level}">{content}</h{level}>"#,
        attr = BlockTag::Heading.attr()
    )
}

/// `wrapper` is [`BlockTag::Bullet`] or [`BlockTag::Ordered`]. Empty items
/// hold a `<br>` so they keep their height.
pub fn render_list_item(wrapper: BlockTag, content: &str) -> String {
    let (list, line) = match wrapper {
        BlockTag::Ordered => ("ol", BlockTag::OrderedLine),
        _ => ("ul", BlockTag::BulletLine),
    };
    let content = if content.is_empty() {
        "<br>".to_string()
    } else {
        escape_html(content)
    };
    format!(
        r#"<div {wrapper}="1"><{list}><li {line}="1">{content}</li></{list}></div>"#,
        wrapper = wrapper.attr(),
        line = line.attr(),
    )
}

pub fn embed_url(embed_host: &str, video_id: &str) -> String {
    format!("{}/embed?v={video_id}", embed_host.trim_end_matches('/'))
}

/// The embed is not editable, so it is framed by two editable sentinel lines;
/// the caret lands in the one after it.
pub fn render_video(video_id: &str, embed_host: &str) -> String {
    format!(
        concat!(
            r#"<div {before}=""><br></div>"#,
            r#"<div {video}="" contenteditable="false">"#,
            r#"<div style="height:0;overflow:hidden;padding-top:56.25%;position:relative;width:100%;">"#,
            r#"<iframe style="position:absolute;top:0;left:0;width:100%;height:100%;" src="{src}" frameborder="0" "#,
            r#"allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#,
            r#"</div></div>"#,
            r#"<div {after}=""><br></div>"#,
        ),
        before = BlockTag::BeforeVideo.attr(),
        video = BlockTag::Video.attr(),
        src = escape_html(&embed_url(embed_host, video_id)),
        after = BlockTag::AfterVideo.attr(),
    )
}
