use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use ::markdown::{CompileOptions, Options};
use regex::Regex;

/// Renders markdown with GitHub flavour. Raw HTML inside the text is kept, as
/// channel authors use it for small layout tweaks.
pub fn render_markdown(md_text: &str) -> Result<String> {
    let options = Options {
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::gfm()
        },
        ..Options::gfm()
    };

    ::markdown::to_html_with_options(md_text, &options)
        .map_err(|e| anyhow!("Error rendering markdown: {}", e.reason))
}

/// Turns every `headline: Something` line into a level three heading.
pub fn promote_headlines(text: &str) -> String {
    lazy_static! {
        static ref HEADLINE_REGEX: Regex = Regex::new(r"(?im)^[ \t]*headline:[ \t]*(?P<title>.+?)[ \t]*$").unwrap();
    }
    HEADLINE_REGEX.replace_all(text, "### $title").into_owned()
}
