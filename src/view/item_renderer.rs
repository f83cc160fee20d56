use std::collections::HashMap;

use quick_xml::escape::escape;

use crate::channel::{Channel, ContentItem};
use crate::content::render_content;
use crate::description::{extract_style, parse_description};
use crate::slug_map::SlugMap;
use crate::template::{substitute, Templates};
use crate::text_utils::format_timestamp;
use crate::view::{display_title, pinned_class, render_layout};

/// Renders the page of a single item.
pub fn render_item(channel: &Channel, slug_map: &SlugMap, templates: &Templates, item: &ContentItem) -> String {
    let description = parse_description(item.description.as_deref().unwrap_or(""));
    let style = extract_style(item.description.as_deref());
    let title = display_title(item);

    let values = HashMap::from([
        ("id", item.id.to_string()),
        ("class", item.class.to_string()),
        ("title", escape(title.as_str()).into_owned()),
        ("content", render_content(item)),
        ("description", description.html),
        ("style", style.style_attr()),
        ("pinned_class", pinned_class(description.is_pinned).to_string()),
        ("created", format_timestamp(&item.created_at)),
        ("updated", format_timestamp(&item.updated_at)),
    ]);
    let content = substitute(&templates.item, &values);

    render_layout(templates, channel, slug_map, Some(&title), content)
}

#[cfg(test)]
mod tests {
    use crate::test_data::{channel, templates};

    use super::*;

    #[test]
    fn test_text_item_page() {
        let channel = channel();
        let map = SlugMap::build(&channel.contents);
        let html = render_item(&channel, &map, &templates(), &channel.contents[0]);

        assert!(html.starts_with("<html><head><title>Hello, World! | Field notes</title></head>"));
        assert!(html.contains(concat!(
            r#"<main><article class="item item-text pinned"><h1>Hello, World!</h1>"#,
            "<h3>Greeting</h3>\n<p>This is <strong>bold</strong>.</p>",
            r#"<div class="tags" data-filter>"#,
        )), "{}", html);
        assert!(html.contains(r#"<div class="description-text"><p>Some text here.</p></div><time>2024-03-01 10:00</time><time>2024-03-05 12:00</time></article></main>"#));
    }

    #[test]
    fn test_styled_item_page() {
        let channel = channel();
        let map = SlugMap::build(&channel.contents);
        let html = render_item(&channel, &map, &templates(), &channel.contents[1]);
        assert!(html.contains(r#"<article class="item item-image" style="background-color: #ffeecc; border: 1px solid red;"><h1>Sunset</h1>"#));
    }

    #[test]
    fn test_broken_item_still_renders() {
        let mut channel = channel();
        channel.contents[1].image = None;
        let map = SlugMap::build(&channel.contents);
        let html = render_item(&channel, &map, &templates(), &channel.contents[1]);
        assert!(html.contains(crate::content::classifier::IMAGE_MISSING));
    }
}
