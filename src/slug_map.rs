//! Maps every item of a channel to the directory its page is written to.
//!
//! Slugs come from the title, then the content, then `untitled-<id>`. Two
//! items can end up with the same slug; the later one in channel order takes
//! the slot and the earlier one is only reachable from the home page block.
//! Each such replacement is kept in [`SlugMap::collisions`] and logged.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use spdlog::warn;

use crate::channel::{BlockClass, ContentItem};
use crate::slug::{slugify, try_slugify, Slug};

/// Picks the text the slug of `item` comes from: its title, then its
/// content, then `untitled-<id>`. Text that leaves nothing after slugging
/// (emoji or punctuation only) is skipped.
fn pick_slug(item: &ContentItem) -> (String, Slug) {
    for text in [item.trimmed_title(), item.trimmed_content()].into_iter().flatten() {
        if let Some(slug) = try_slugify(text) {
            return (text.to_string(), slug);
        }
    }
    let label = format!("untitled-{}", item.id);
    let slug = slugify(&label);
    (label, slug)
}

/// Text a slug is generated from.
pub fn slug_source(item: &ContentItem) -> String {
    pick_slug(item).0
}

pub fn item_slug(item: &ContentItem) -> Slug {
    pick_slug(item).1
}

pub struct SlugEntry<'a> {
    pub slug: Slug,
    /// The text the slug was generated from.
    pub label: String,
    pub item: &'a ContentItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub slug: Slug,
    pub replaced: u64,
    pub by: u64,
}

pub struct SlugMap<'a> {
    entries: Vec<SlugEntry<'a>>,
    index: HashMap<Slug, usize>,
    collisions: Vec<Collision>,
}

impl<'a> SlugMap<'a> {
    /// Builds the map in channel order. A slug keeps the position of its first
    /// appearance and the item of its last one.
    pub fn build(items: &'a [ContentItem]) -> SlugMap<'a> {
        let mut map = SlugMap {
            entries: Vec::with_capacity(items.len()),
            index: HashMap::with_capacity(items.len()),
            collisions: vec![],
        };
        for item in items {
            map.insert(item);
        }
        map
    }

    fn insert(&mut self, item: &'a ContentItem) {
        let (label, slug) = pick_slug(item);

        match self.index.get(&slug) {
            Some(&pos) => {
                let entry = &mut self.entries[pos];
                warn!("Slug '{}' of item {} replaces item {}", slug, item.id, entry.item.id);
                self.collisions.push(Collision {
                    slug: slug.clone(),
                    replaced: entry.item.id,
                    by: item.id,
                });
                entry.label = label;
                entry.item = item;
            }
            None => {
                self.index.insert(slug.clone(), self.entries.len());
                self.entries.push(SlugEntry { slug, label, item });
            }
        }
    }

    pub fn get(&self, slug: &Slug) -> Option<&'a ContentItem> {
        self.index.get(slug).map(|&pos| self.entries[pos].item)
    }

    pub fn entries(&self) -> &[SlugEntry<'a>] {
        &self.entries
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the side file at `path` with the current map.
    pub fn persist(&self, path: &Path) -> Result<()> {
        remove_side_file(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Error creating directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Error writing slug map {}", path.display()))
    }
}

/// Deletes the side file at `path`. A missing file is fine.
pub fn remove_side_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Error removing slug map {}", path.display())),
    }
}

/// What the side file stores for each slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugRecord {
    pub id: u64,
    pub title: String,
    pub class: BlockClass,
    pub original_title: Option<String>,
}

impl Serialize for SlugMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            let record = SlugRecord {
                id: entry.item.id,
                title: entry.label.clone(),
                class: entry.item.class,
                original_title: entry.item.title.clone(),
            };
            map.serialize_entry(entry.slug.as_str(), &record)?;
        }
        map.end()
    }
}

/// The side file read back from disk, keyed by item id.
pub struct SlugIndex {
    by_id: HashMap<u64, Slug>,
}

impl SlugIndex {
    pub fn load(path: &Path) -> Result<SlugIndex> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Error reading slug map {}", path.display()))?;
        Self::parse(&json).with_context(|| format!("Error parsing slug map {}", path.display()))
    }

    pub fn parse(json: &str) -> Result<SlugIndex> {
        let records: HashMap<String, SlugRecord> = serde_json::from_str(json)?;
        let by_id = records.into_iter()
            .map(|(slug, record)| (record.id, Slug(slug)))
            .collect();
        Ok(SlugIndex { by_id })
    }

    pub fn slug_for(&self, id: u64) -> Option<&Slug> {
        self.by_id.get(&id)
    }
}
