use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

pub const LAYOUT_FILE: &str = "layout.html";
pub const HOME_FILE: &str = "home.html";
pub const ITEM_FILE: &str = "item.html";
pub const NOT_FOUND_FILE: &str = "404.html";

/// Replaces every `{{ name }}` token in `template` with its value. Unknown
/// names and empty values become empty strings.
pub fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    lazy_static! {
        static ref TOKEN_REGEX: Regex = Regex::new(r"\{\{\s*(?P<name>[A-Za-z0-9_]+)\s*\}\}").unwrap();
    }

    TOKEN_REGEX.replace_all(template, |caps: &Captures| {
        values.get(&caps["name"]).cloned().unwrap_or_default()
    }).into_owned()
}

/// Raw sources of the four page shapes.
#[derive(Debug, Clone)]
pub struct Templates {
    pub layout: String,
    pub home: String,
    pub item: String,
    pub not_found: String,
}

impl Templates {
    pub fn load(template_dir: &Path) -> Result<Templates> {
        Ok(Templates {
            layout: read_template(template_dir, LAYOUT_FILE)?,
            home: read_template(template_dir, HOME_FILE)?,
            item: read_template(template_dir, ITEM_FILE)?,
            not_found: read_template(template_dir, NOT_FOUND_FILE)?,
        })
    }
}

fn read_template(template_dir: &Path, name: &str) -> Result<String> {
    let path = template_dir.join(name);
    fs::read_to_string(&path).with_context(|| format!("Error reading template {}", path.display()))
}
