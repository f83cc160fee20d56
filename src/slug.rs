use std::fmt;
use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_SLUG_LEN: usize = 100;

/// Used when the source text has nothing left after stripping.
const EMPTY_SLUG: &str = "untitled";

#[derive(Debug, Clone, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts arbitrary text into a URL path segment.
///
/// The text is transliterated to ASCII and lowercased, everything that is not a
/// letter, digit, whitespace, underscore or hyphen is dropped, separator runs
/// become a single hyphen, and a leading `123-` run is removed. The result is
/// capped to [`MAX_SLUG_LEN`] characters and always matches
/// `[a-z0-9]+(-[a-z0-9]+)*`. Text with nothing usable becomes `untitled`.
pub fn slugify(text: &str) -> Slug {
    try_slugify(text).unwrap_or_else(|| Slug(EMPTY_SLUG.to_string()))
}

/// Same as [`slugify`], but `None` when nothing is left after stripping, so
/// callers can fall back to other text.
pub fn try_slugify(text: &str) -> Option<Slug> {
    lazy_static! {
        static ref NON_WORD: Regex = Regex::new(r"[^a-z0-9\s_-]").unwrap();
        static ref SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();
        static ref LEADING_NUMBER: Regex = Regex::new(r"^(?:[0-9]+-)+").unwrap();
    }

    let ascii = unidecode::unidecode(text).to_lowercase();
    let stripped = NON_WORD.replace_all(ascii.trim(), "");
    let dashed = SEPARATORS.replace_all(&stripped, "-");
    let trimmed = dashed.trim_matches('-');
    let unnumbered = LEADING_NUMBER.replace(trimmed, "");

    // Everything left is ASCII, so byte slicing is safe here
    let capped = if unnumbered.len() > MAX_SLUG_LEN {
        &unnumbered[..MAX_SLUG_LEN]
    } else {
        &unnumbered[..]
    };
    let capped = capped.trim_end_matches('-');

    if capped.is_empty() {
        None
    } else {
        Some(Slug(capped.to_string()))
    }
}
