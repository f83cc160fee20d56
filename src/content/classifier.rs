use anyhow::Result;
use quick_xml::escape::escape;
use spdlog::warn;

use crate::channel::{BlockClass, ContentItem};
use crate::content::links::open_external_links;
use crate::content::markdown::render_markdown;
use crate::content::text_blocks::TextBody;
use crate::description::render_description_prose;

pub const IMAGE_MISSING: &str = r#"<div class="block-error">Image not available</div>"#;
pub const ATTACHMENT_MISSING: &str = r#"<div class="block-error">Attachment not available</div>"#;
pub const EMBED_MISSING: &str = r#"<div class="block-error">Embedded media not available</div>"#;
pub const UNTITLED_LINK: &str = "Untitled Link";

/// Renders the body of one item as an HTML fragment.
///
/// Never fails: a rendering error becomes a visible inline error block so one
/// broken item can't take the page down with it.
pub fn render_content(item: &ContentItem) -> String {
    match classify(item) {
        Ok(html) => open_external_links(&html),
        Err(e) => {
            warn!("Error rendering block {} ({}): {:#}", item.id, item.class, e);
            format!(r#"<div class="block-error">Error rendering block {}: {}</div>"#, item.id, escape(e.to_string().as_str()))
        }
    }
}

fn classify(item: &ContentItem) -> Result<String> {
    match item.class {
        BlockClass::Text => render_text(item),
        BlockClass::Image => Ok(render_image(item)),
        BlockClass::Link => render_link(item),
        BlockClass::Attachment => Ok(render_attachment(item)),
        BlockClass::Media => Ok(render_media(item)),
        BlockClass::Other => render_other(item),
    }
}

fn render_text(item: &ContentItem) -> Result<String> {
    let raw = item.content.as_deref().unwrap_or("");
    TextBody::parse(raw).render()
}

fn render_image(item: &ContentItem) -> String {
    let Some(url) = item.image.as_ref().and_then(|i| i.display_url()) else {
        return IMAGE_MISSING.to_string();
    };
    let alt = item.trimmed_title().unwrap_or("");
    format!(r#"<img class="block-image" src="{}" alt="{}" loading="lazy">"#, escape(url), escape(alt))
}

fn render_link(item: &ContentItem) -> Result<String> {
    let url = item.source.as_ref()
        .and_then(|s| s.url.as_deref())
        .filter(|u| !u.trim().is_empty());
    let label = item.trimmed_title()
        .or_else(|| item.source.as_ref().and_then(|s| s.title.as_deref()).filter(|t| !t.trim().is_empty()))
        .or(url)
        .unwrap_or(UNTITLED_LINK);

    let mut html = match url {
        Some(url) => format!(r#"<h2 class="link-title"><a href="{}">{}</a></h2>"#, escape(url), escape(label)),
        None => format!(r#"<h2 class="link-title">{}</h2>"#, escape(label)),
    };

    if let Some(text) = item.trimmed_description().and_then(render_description_prose) {
        html.push_str(r#"<div class="link-description">"#);
        html.push_str(&text);
        html.push_str("</div>");
    }

    if let Some(preview) = item.image.as_ref().and_then(|i| i.display_url()) {
        html.push_str(&format!(r#"<img class="link-preview" src="{}" alt="{}" loading="lazy">"#, escape(preview), escape(label)));
    }

    Ok(html)
}

fn render_attachment(item: &ContentItem) -> String {
    let Some(attachment) = item.attachment.as_ref() else {
        return ATTACHMENT_MISSING.to_string();
    };
    let Some(url) = attachment.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        return ATTACHMENT_MISSING.to_string();
    };
    let name = attachment.file_name.as_deref()
        .or(item.trimmed_title())
        .unwrap_or("attachment");
    format!(r#"<a class="attachment" href="{}" download>Download {}</a>"#, escape(url), escape(name))
}

fn render_media(item: &ContentItem) -> String {
    match item.embed.as_ref().and_then(|e| e.html.as_deref()).filter(|h| !h.trim().is_empty()) {
        Some(embed) => format!(r#"<div class="embed">{}</div>"#, embed),
        None => EMBED_MISSING.to_string(),
    }
}

fn render_other(item: &ContentItem) -> Result<String> {
    let mut html = String::new();
    if let Some(title) = item.trimmed_title() {
        html.push_str(&format!("<h2>{}</h2>", escape(title)));
    }
    if let Some(content) = item.trimmed_content() {
        html.push_str(&render_markdown(content)?);
    }
    if let Some(description) = item.trimmed_description() {
        html.push_str(&render_markdown(description)?);
    }
    Ok(html)
}
