use std::collections::HashMap;

use quick_xml::escape::escape;

use crate::channel::{Channel, ContentItem};
use crate::slug_map::SlugMap;
use crate::template::{substitute, Templates};
use crate::text_utils::{format_timestamp, truncate_chars};

pub mod home_renderer;
pub mod item_renderer;
pub mod not_found;
pub mod rss_renderer;

const TITLE_MAX_CHARS: usize = 50;
const NAV_MAX_CHARS: usize = 30;

/// Title shown for an item: its title, the start of its content, or its id.
pub fn display_title(item: &ContentItem) -> String {
    if let Some(title) = item.trimmed_title() {
        return title.to_string();
    }
    if let Some(content) = item.trimmed_content() {
        return truncate_chars(content, TITLE_MAX_CHARS);
    }
    format!("Untitled #{}", item.id)
}

pub(crate) fn pinned_class(is_pinned: bool) -> &'static str {
    if is_pinned { " pinned" } else { "" }
}

fn render_nav(slug_map: &SlugMap) -> String {
    let links: Vec<String> = slug_map.entries().iter()
        .map(|entry| {
            let label = truncate_chars(&display_title(entry.item), NAV_MAX_CHARS);
            format!(r#"<li><a href="/{}/">{}</a></li>"#, entry.slug, escape(label.as_str()))
        })
        .collect();
    links.join("\n")
}

/// Wraps a rendered page body with the outer layout.
pub(crate) fn render_layout(
    templates: &Templates,
    channel: &Channel,
    slug_map: &SlugMap,
    page_title: Option<&str>,
    content: String,
) -> String {
    let title = match page_title {
        Some(page_title) => format!("{} | {}", page_title, channel.title),
        None => channel.title.clone(),
    };

    let values = HashMap::from([
        ("title", escape(title.as_str()).into_owned()),
        ("channel_title", escape(channel.title.as_str()).into_owned()),
        ("nav", render_nav(slug_map)),
        ("updated", format_timestamp(&channel.updated_at)),
        ("content", content),
    ]);
    substitute(&templates.layout, &values)
}
