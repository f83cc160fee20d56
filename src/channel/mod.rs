use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod client;

/// The block types a channel can hold. Anything the API adds later lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockClass {
    Text,
    Image,
    Link,
    Attachment,
    Media,
    #[default]
    #[serde(other)]
    Other,
}

impl Display for BlockClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockClass::Text => "text",
            BlockClass::Image => "image",
            BlockClass::Link => "link",
            BlockClass::Attachment => "attachment",
            BlockClass::Media => "media",
            BlockClass::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageVersion {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub display: Option<ImageVersion>,
    pub large: Option<ImageVersion>,
    pub original: Option<ImageVersion>,
}

impl ImagePayload {
    pub fn display_url(&self) -> Option<&str> {
        self.display.as_ref()
            .and_then(|v| v.url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    pub url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedPayload {
    pub html: Option<String>,
}

/// One block of channel content, as delivered by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub class: BlockClass,
    #[serde(default)]
    pub image: Option<ImagePayload>,
    #[serde(default)]
    pub source: Option<SourcePayload>,
    #[serde(default)]
    pub attachment: Option<AttachmentPayload>,
    #[serde(default)]
    pub embed: Option<EmbedPayload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Title with surrounding whitespace removed, `None` when blank.
    pub fn trimmed_title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Content with surrounding whitespace removed, `None` when blank.
    pub fn trimmed_content(&self) -> Option<&str> {
        non_blank(self.content.as_deref())
    }

    pub fn trimmed_description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub title: String,
    #[serde(default)]
    pub length: usize,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub contents: Vec<ContentItem>,
}

#[cfg(test)]
mod tests {
    use crate::test_data::CHANNEL_JSON;

    use super::*;

    #[test]
    fn test_parse_channel() {
        let channel: Channel = serde_json::from_str(CHANNEL_JSON).unwrap();
        assert_eq!(channel.title, "Field notes");
        assert_eq!(channel.contents.len(), 6);

        let classes: Vec<BlockClass> = channel.contents.iter().map(|c| c.class).collect();
        assert_eq!(classes, vec![
            BlockClass::Text,
            BlockClass::Image,
            BlockClass::Link,
            BlockClass::Attachment,
            BlockClass::Media,
            BlockClass::Other,
        ]);
    }

    #[test]
    fn test_unknown_class_is_other() {
        let json = r#"{"id": 1, "class": "Channel", "created_at": "2024-01-02T03:04:05Z", "updated_at": "2024-01-02T03:04:05Z"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.class, BlockClass::Other);
        assert_eq!(item.title, None);
    }

    #[test]
    fn test_trimmed_fields() {
        let json = r#"{"id": 1, "title": "   ", "content": "  body ", "class": "Text", "created_at": "2024-01-02T03:04:05Z", "updated_at": "2024-01-02T03:04:05Z"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.trimmed_title(), None);
        assert_eq!(item.trimmed_content(), Some("body"));
    }

    #[test]
    fn test_display_url() {
        let image = ImagePayload {
            display: Some(ImageVersion { url: Some("".to_string()) }),
            ..Default::default()
        };
        assert_eq!(image.display_url(), None);
    }
}
