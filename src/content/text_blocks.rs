use anyhow::Result;
use quick_xml::escape::escape;
use serde::Deserialize;

use crate::content::markdown::{promote_headlines, render_markdown};

/// A sub-block of a structured text item.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum TextBlock {
    Text {
        text: String,
    },
    Image {
        #[serde(alias = "src")]
        url: String,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        alt: Option<String>,
    },
}

/// What the raw content of a text item turned out to be.
#[derive(Debug, PartialEq)]
pub enum TextBody<'a> {
    Structured(Vec<TextBlock>),
    Markdown(&'a str),
}

impl<'a> TextBody<'a> {
    /// Tries the structured shape first. Anything that isn't a non-empty JSON
    /// array of known blocks is plain markdown.
    pub fn parse(raw: &'a str) -> TextBody<'a> {
        let trimmed = raw.trim_start();
        if !trimmed.starts_with('[') {
            return TextBody::Markdown(raw);
        }
        match serde_json::from_str::<Vec<TextBlock>>(raw) {
            Ok(blocks) if !blocks.is_empty() => TextBody::Structured(blocks),
            _ => TextBody::Markdown(raw),
        }
    }

    pub fn render(&self) -> Result<String> {
        match self {
            TextBody::Markdown(text) => render_markdown(&promote_headlines(text)),
            TextBody::Structured(blocks) => {
                let mut html = String::new();
                for block in blocks {
                    html.push_str(&render_block(block)?);
                    html.push('\n');
                }
                Ok(html)
            }
        }
    }
}

fn render_block(block: &TextBlock) -> Result<String> {
    match block {
        TextBlock::Text { text } => render_markdown(&promote_headlines(text)),
        TextBlock::Image { url, caption, alt } => {
            let alt = alt.as_deref().or(caption.as_deref()).unwrap_or("");
            let mut figure = format!(r#"<figure><img src="{}" alt="{}" loading="lazy">"#, escape(url.as_str()), escape(alt));
            if let Some(caption) = caption.as_deref().filter(|c| !c.trim().is_empty()) {
                figure.push_str(&format!("<figcaption>{}</figcaption>", escape(caption)));
            }
            figure.push_str("</figure>");
            Ok(figure)
        }
    }
}
