use std::collections::HashMap;

use quick_xml::escape::escape;

use crate::channel::{Channel, ContentItem};
use crate::description::{extract_style, parse_description};
use crate::slug_map::{item_slug, SlugMap};
use crate::template::{substitute, Templates};
use crate::text_utils::{encode_uri_component, format_timestamp};
use crate::view::{display_title, pinned_class, render_layout};

struct Summary<'a> {
    item: &'a ContentItem,
    is_pinned: bool,
    html: String,
}

fn render_summary(item: &ContentItem) -> Summary {
    let description = parse_description(item.description.as_deref().unwrap_or(""));
    let style = extract_style(item.description.as_deref());
    let tags: Vec<String> = description.tags.iter().map(|t| encode_uri_component(t)).collect();
    let title = display_title(item);

    let html = format!(
        concat!(
            r#"<article class="block block-{class}{pinned}" data-tags="{tags}"{style}>"#,
            r#"<h2><a href="/{slug}/">{title}</a></h2>"#,
            "{description}",
            r#"<footer class="block-meta"><time datetime="{created_iso}">Created {created}</time> "#,
            r#"<time datetime="{updated_iso}">Updated {updated}</time></footer>"#,
            "</article>",
        ),
        class = item.class,
        pinned = pinned_class(description.is_pinned),
        tags = tags.join(" "),
        style = style.style_attr(),
        slug = item_slug(item),
        title = escape(title.as_str()),
        description = description.html,
        created_iso = item.created_at.to_rfc3339(),
        created = format_timestamp(&item.created_at),
        updated_iso = item.updated_at.to_rfc3339(),
        updated = format_timestamp(&item.updated_at),
    );

    Summary {
        item,
        is_pinned: description.is_pinned,
        html,
    }
}

/// Renders the home page: one summary block per channel item, pinned items
/// first, then newest first.
///
/// Every item gets a block, including those whose slug was taken by a later
/// item; their link then leads to that later item's page.
pub fn render_home(channel: &Channel, slug_map: &SlugMap, templates: &Templates) -> String {
    let mut summaries: Vec<Summary> = channel.contents.iter().map(render_summary).collect();
    summaries.sort_by(|a, b| {
        b.is_pinned.cmp(&a.is_pinned)
            .then_with(|| b.item.created_at.cmp(&a.item.created_at))
    });

    let blocks: Vec<String> = summaries.into_iter().map(|s| s.html).collect();
    let values = HashMap::from([
        ("channel_title", escape(channel.title.as_str()).into_owned()),
        ("count", channel.contents.len().to_string()),
        ("blocks", blocks.join("\n")),
    ]);
    let content = substitute(&templates.home, &values);

    render_layout(templates, channel, slug_map, None, content)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::test_data::{channel, templates};

    use super::*;

    fn block_ids(html: &str, ids: &[&str]) -> Vec<usize> {
        ids.iter().map(|id| html.find(&format!(r#"href="/{}/""#, id)).unwrap()).collect()
    }

    #[test]
    fn test_pinned_first_then_newest() {
        let mut channel = channel();
        channel.contents.truncate(2);
        // A: not pinned, created day 1. B: pinned, created day 0.
        channel.contents[0].title = Some("A".to_string());
        channel.contents[0].description = None;
        channel.contents[0].created_at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        channel.contents[1].title = Some("B".to_string());
        channel.contents[1].description = Some("pin: top".to_string());
        channel.contents[1].created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let map = SlugMap::build(&channel.contents);
        let html = render_home(&channel, &map, &templates());
        let blocks = html.split(r#"<div class="blocks">"#).nth(1).unwrap();
        let pos = block_ids(blocks, &["b", "a"]);
        assert!(pos[0] < pos[1], "{}", html);
    }

    #[test]
    fn test_fixture_order() {
        let channel = channel();
        let map = SlugMap::build(&channel.contents);
        let html = render_home(&channel, &map, &templates());
        let blocks = html.split(r#"<div class="blocks">"#).nth(1).unwrap();

        // hello-world is pinned, the rest follow by creation date
        let pos = block_ids(blocks, &["hello-world", "sunset", "a-language-empowering-everyone", "field-guide", "notes", "untitled-106"]);
        let mut sorted = pos.clone();
        sorted.sort();
        assert_eq!(pos, sorted);
    }

    #[test]
    fn test_summary_block() {
        let channel = channel();
        let html = render_summary(&channel.contents[1]).html;
        assert_eq!(html, concat!(
            r#"<article class="block block-image" data-tags="" style="background-color: #ffeecc; border: 1px solid red;">"#,
            r#"<h2><a href="/sunset/">Sunset</a></h2>"#,
            r#"<div class="description-text"><p>Taken from the pier.</p></div>"#,
            r#"<footer class="block-meta"><time datetime="2024-02-20T08:30:00+00:00">Created 2024-02-20 08:30</time> "#,
            r#"<time datetime="2024-02-21T08:30:00+00:00">Updated 2024-02-21 08:30</time></footer>"#,
            "</article>",
        ));

        let pinned = render_summary(&channel.contents[0]);
        assert!(pinned.is_pinned);
        assert!(pinned.html.starts_with(r#"<article class="block block-text pinned" data-tags="sky water">"#));
    }

    #[test]
    fn test_colliding_items_keep_their_blocks() {
        let mut channel = channel();
        channel.contents[1].title = Some("Hello World".to_string());
        let map = SlugMap::build(&channel.contents);
        assert_eq!(map.len(), 5);

        let html = render_home(&channel, &map, &templates());
        assert_eq!(html.matches(r#"<h2><a href="/hello-world/">"#).count(), 2);
        assert_eq!(html.matches("<article ").count(), 6);
    }

    #[test]
    fn test_layout_is_applied() {
        let channel = channel();
        let map = SlugMap::build(&channel.contents);
        let html = render_home(&channel, &map, &templates());
        assert!(html.starts_with("<html><head><title>Field notes</title></head>"));
        assert!(html.contains(r#"<li><a href="/sunset/">Sunset</a></li>"#));
        assert!(html.contains("<footer>2024-03-05 12:00 <span data-page-size>?</span></footer>"));
    }
}
