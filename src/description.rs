//! Block descriptions double as a tiny metadata format. Lines such as
//! `pin: top`, `tags: a, b` or `colour: #fec` are directives, everything else
//! is markdown prose.
//!
//! Example
//! ```text
//! pin: top
//! tags: sky, water
//! colour: #ffeecc
//! author: Ada Lovelace
//!
//! Some text here.
//! ```

use lazy_static::lazy_static;
use quick_xml::escape::escape;
use regex::Regex;
use spdlog::warn;

use crate::content::links::open_external_links;
use crate::content::markdown::render_markdown;
use crate::slug::slugify;
use crate::text_utils::encode_uri_component;

#[derive(Debug, PartialEq)]
enum Directive<'a> {
    Pin(&'a str),
    Colour(&'a str),
    Border(&'a str),
    Tags(&'a str),
    Author(&'a str),
}

fn parse_directive(line: &str) -> Option<Directive> {
    lazy_static! {
        static ref DIRECTIVE_REGEX: Regex = Regex::new(
            r"(?i)^\s*(?P<key>pin|colour|border|tags|author)\s*:\s*(?P<value>.*?)\s*$"
        ).unwrap();
    }

    let caps = DIRECTIVE_REGEX.captures(line)?;
    let key = caps.name("key")?.as_str();
    let value = caps.name("value")?.as_str();

    let directive = match key.to_ascii_lowercase().as_str() {
        "pin" => Directive::Pin(value),
        "colour" => Directive::Colour(value),
        "border" => Directive::Border(value),
        "tags" => Directive::Tags(value),
        "author" => Directive::Author(value),
        _ => return None,
    };
    Some(directive)
}

#[derive(Debug, Default, PartialEq)]
pub struct ParsedDescription {
    /// Directive fragments in the order they were found, then the prose.
    pub html: String,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    pub author: Option<String>,
}

pub fn parse_description(text: &str) -> ParsedDescription {
    let mut parsed = ParsedDescription::default();
    let mut fragments: Vec<String> = vec![];
    let mut prose = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            prose.push('\n');
            continue;
        }

        match parse_directive(line) {
            Some(Directive::Pin(value)) => {
                if value.eq_ignore_ascii_case("top") {
                    parsed.is_pinned = true;
                }
            }
            // Styling is read separately by extract_style
            Some(Directive::Colour(_)) | Some(Directive::Border(_)) => {}
            Some(Directive::Tags(value)) => {
                let tags = split_tags(value);
                if !tags.is_empty() {
                    fragments.push(render_tags(&tags));
                    parsed.tags.extend(tags);
                }
            }
            Some(Directive::Author(name)) => {
                if !name.is_empty() {
                    fragments.push(render_author(name));
                    parsed.author = Some(name.to_string());
                }
            }
            None => {
                prose.push_str(line);
                prose.push('\n');
            }
        }
    }

    let mut html = fragments.concat();
    if let Some(rendered) = render_prose(&prose) {
        html.push_str(r#"<div class="description-text">"#);
        html.push_str(&rendered);
        html.push_str("</div>");
    }
    parsed.html = open_external_links(&html);

    parsed
}

/// Renders only the prose of a description, leaving every directive line out.
pub fn render_description_prose(text: &str) -> Option<String> {
    let prose: String = text.lines()
        .filter(|line| line.trim().is_empty() || parse_directive(line).is_none())
        .map(|line| format!("{}\n", line))
        .collect();
    render_prose(&prose)
}

fn split_tags(value: &str) -> Vec<String> {
    value.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn render_tags(tags: &[String]) -> String {
    let links: Vec<String> = tags.iter()
        .map(|tag| format!(
            r#"<a class="tag tag-{}" href="/#{}">#{}</a>"#,
            slugify(tag),
            encode_uri_component(tag),
            escape(tag.as_str()),
        ))
        .collect();
    format!(r#"<div class="tags" data-filter>{}</div>"#, links.join(" "))
}

fn render_author(name: &str) -> String {
    format!(r#"<div class="author"><a href="/{}">{}</a></div>"#, encode_uri_component(name), escape(name))
}

fn collapse_blank_lines(text: &str) -> String {
    lazy_static! {
        static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").unwrap();
    }
    BLANK_RUN.replace_all(text, "\n\n").trim().to_string()
}

fn render_prose(prose: &str) -> Option<String> {
    let prose = collapse_blank_lines(prose);
    if prose.is_empty() {
        return None;
    }
    match render_markdown(&prose) {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Error rendering description, using plain text: {:#}", e);
            Some(format!("<p>{}</p>", escape(prose.as_str())))
        }
    }
}

/// Inline colours for a block, read from the `colour:` and `border:` lines of
/// its description.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlockStyle {
    pub background_color: Option<String>,
    pub border_color: Option<String>,
}

impl BlockStyle {
    /// ` style="..."` ready to be placed inside a tag, or an empty string.
    pub fn style_attr(&self) -> String {
        let mut rules = vec![];
        if let Some(ref colour) = self.background_color {
            rules.push(format!("background-color: {};", colour));
        }
        if let Some(ref colour) = self.border_color {
            rules.push(format!("border: 1px solid {};", colour));
        }
        if rules.is_empty() {
            return String::new();
        }
        format!(r#" style="{}""#, rules.join(" "))
    }
}

pub fn extract_style(description: Option<&str>) -> BlockStyle {
    let mut style = BlockStyle::default();
    let Some(description) = description else {
        return style;
    };

    for line in description.lines() {
        // An invalid line leaves an earlier valid colour in place
        match parse_directive(line) {
            Some(Directive::Colour(value)) => {
                if let Some(colour) = css_color(value) {
                    style.background_color = Some(colour);
                }
            }
            Some(Directive::Border(value)) => {
                if let Some(colour) = css_color(value) {
                    style.border_color = Some(colour);
                }
            }
            _ => {}
        }
    }
    style
}

/// Accepts colour names, hex values and functional notations. Anything that
/// could break out of a style attribute is rejected.
fn css_color(value: &str) -> Option<String> {
    lazy_static! {
        static ref COLOR_REGEX: Regex = Regex::new(r"^[#a-zA-Z0-9(),.%/ -]+$").unwrap();
    }
    let value = value.trim();
    if value.is_empty() || !COLOR_REGEX.is_match(value) {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive() {
        assert_eq!(parse_directive("pin: top"), Some(Directive::Pin("top")));
        assert_eq!(parse_directive("  TAGS :  a, b  "), Some(Directive::Tags("a, b")));
        assert_eq!(parse_directive("Colour: #fff"), Some(Directive::Colour("#fff")));
        assert_eq!(parse_directive("author:"), Some(Directive::Author("")));
        assert_eq!(parse_directive("note: something"), None);
        assert_eq!(parse_directive("pinned: top"), None);
        assert_eq!(parse_directive("The tags: are here"), None);
    }

    #[test]
    fn test_pin_tags_and_prose() {
        let parsed = parse_description("pin: top\ntags: sky, water\nSome text here.");
        assert!(parsed.is_pinned);
        assert_eq!(parsed.tags, vec!["sky", "water"]);
        assert_eq!(parsed.html, concat!(
            r#"<div class="tags" data-filter><a class="tag tag-sky" href="/#sky">#sky</a> <a class="tag tag-water" href="/#water">#water</a></div>"#,
            r#"<div class="description-text"><p>Some text here.</p></div>"#,
        ));
        assert!(!parsed.html.contains("pin:"));
        assert!(!parsed.html.contains("tags:"));
    }

    #[test]
    fn test_only_directives() {
        let parsed = parse_description("pin: top\ncolour: red\nborder: blue");
        assert!(parsed.is_pinned);
        assert_eq!(parsed.html, "");
    }

    #[test]
    fn test_pin_other_value() {
        let parsed = parse_description("pin: bottom\ntext");
        assert!(!parsed.is_pinned);
        assert_eq!(parsed.html, r#"<div class="description-text"><p>text</p></div>"#);
    }

    #[test]
    fn test_tags_are_encoded() {
        let parsed = parse_description("tags: deep sea, , R&D");
        assert_eq!(parsed.tags, vec!["deep sea", "R&D"]);
        assert_eq!(parsed.html, concat!(
            r#"<div class="tags" data-filter><a class="tag tag-deep-sea" href="/#deep%20sea">#deep sea</a> "#,
            r#"<a class="tag tag-rd" href="/#R%26D">#R&amp;D</a></div>"#,
        ));
    }

    #[test]
    fn test_empty_tags_line() {
        let parsed = parse_description("tags: , ,");
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.html, "");
    }

    #[test]
    fn test_author() {
        let parsed = parse_description("author: Ada Lovelace");
        assert_eq!(parsed.author.as_deref(), Some("Ada Lovelace"));
        assert_eq!(parsed.html, r#"<div class="author"><a href="/Ada%20Lovelace">Ada Lovelace</a></div>"#);
    }

    #[test]
    fn test_multiline_markdown_survives() {
        let text = "Intro line\nsecond line\n\n\n\n- one\n- two\ntags: list\n\nOutro";
        let parsed = parse_description(text);
        assert_eq!(parsed.html, concat!(
            r#"<div class="tags" data-filter><a class="tag tag-list" href="/#list">#list</a></div>"#,
            "<div class=\"description-text\"><p>Intro line\nsecond line</p>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n<p>Outro</p></div>",
        ));
    }

    #[test]
    fn test_prose_links_open_outside() {
        let parsed = parse_description("See [this](https://example.com)");
        assert_eq!(
            parsed.html,
            r#"<div class="description-text"><p>See <a href="https://example.com" target="_blank" rel="noopener noreferrer">this</a></p></div>"#
        );
    }

    #[test]
    fn test_prose_only() {
        assert_eq!(
            render_description_prose("author: Ada\nAn essay on *repair*\ntags: a").as_deref(),
            Some("<p>An essay on <em>repair</em></p>")
        );
        assert_eq!(render_description_prose("pin: top\ncolour: red"), None);
    }

    #[test]
    fn test_extract_style() {
        let style = extract_style(Some("colour: #ffeecc\nborder: red\nhello"));
        assert_eq!(style, BlockStyle {
            background_color: Some("#ffeecc".to_string()),
            border_color: Some("red".to_string()),
        });
        assert_eq!(style.style_attr(), r#" style="background-color: #ffeecc; border: 1px solid red;""#);
    }

    #[test]
    fn test_invalid_colour_keeps_earlier_one() {
        let style = extract_style(Some("colour: #ffeecc\ncolour: red\" onclick=\"x\nborder: blue\nborder: ;;"));
        assert_eq!(style, BlockStyle {
            background_color: Some("#ffeecc".to_string()),
            border_color: Some("blue".to_string()),
        });

        let style = extract_style(Some("colour: red\ncolour: blue"));
        assert_eq!(style.background_color.as_deref(), Some("blue"));
    }

    #[test]
    fn test_extract_style_rejects_injection() {
        let style = extract_style(Some("colour: red\" onclick=\"x\nborder: blue; display: none"));
        assert_eq!(style, BlockStyle::default());
        assert_eq!(style.style_attr(), "");
        assert_eq!(extract_style(None), BlockStyle::default());
    }
}
