use lazy_static::lazy_static;
use regex::{Captures, Regex};

const EXTERNAL_ATTRS: &str = r#" target="_blank" rel="noopener noreferrer""#;

/// Adds `target="_blank" rel="noopener noreferrer"` to every anchor pointing
/// at an absolute external URL that doesn't already choose a target.
pub fn open_external_links(html: &str) -> String {
    lazy_static! {
        static ref ANCHOR_REGEX: Regex = Regex::new(r"(?i)<a(?P<attrs>\s[^>]*?)\s*>").unwrap();
        static ref EXTERNAL_HREF: Regex = Regex::new(r#"(?i)\bhref\s*=\s*["']?(?:https?:)?//"#).unwrap();
        static ref TARGET_ATTR: Regex = Regex::new(r"(?i)\btarget\s*=").unwrap();
    }

    ANCHOR_REGEX.replace_all(html, |caps: &Captures| {
        let attrs = &caps["attrs"];
        if EXTERNAL_HREF.is_match(attrs) && !TARGET_ATTR.is_match(attrs) {
            format!("<a{}{}>", attrs, EXTERNAL_ATTRS)
        } else {
            caps[0].to_string()
        }
    }).into_owned()
}
