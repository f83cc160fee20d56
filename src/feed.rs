use std::cmp::Reverse;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use spdlog::info;

use crate::channel::{BlockClass, Channel, ContentItem};
use crate::config::{Config, RssFeed};
use crate::content::render_content;
use crate::slug_map::SlugIndex;
use crate::view::display_title;
use crate::view::rss_renderer::{FeedEntry, RssChannel};

pub const FEED_FILE: &str = "rss.xml";

fn in_feed(item: &ContentItem) -> bool {
    matches!(item.class, BlockClass::Text | BlockClass::Link)
}

/// Most recently updated text and link items, at most `page_size` of them.
pub fn feed_items<'a>(channel: &'a Channel, page_size: usize) -> Vec<&'a ContentItem> {
    let mut items: Vec<&ContentItem> = channel.contents.iter().filter(|i| in_feed(i)).collect();
    items.sort_by_key(|item| Reverse(item.updated_at));
    items.truncate(page_size);
    items
}

fn feed_entry(item: &ContentItem, slugs: &SlugIndex) -> FeedEntry {
    let path = match slugs.slug_for(item.id) {
        Some(slug) => slug.to_string(),
        None => item.id.to_string(),
    };

    FeedEntry {
        title: display_title(item),
        path,
        guid: item.id.to_string(),
        description: render_content(item),
        pub_date: item.updated_at,
    }
}

pub fn render_feed(feed: &RssFeed, channel: &Channel, slugs: &SlugIndex) -> Result<Vec<u8>> {
    let entries: Vec<FeedEntry> = feed_items(channel, feed.page_size as usize)
        .into_iter()
        .map(|item| feed_entry(item, slugs))
        .collect();

    let rss = RssChannel {
        ch_title: &feed.title,
        ch_link: &feed.site_url,
        ch_desc: &feed.description,
    };
    rss.render(&entries).map_err(|e| anyhow!("Error rendering feed: {}", e))
}

/// Writes `rss.xml` into the output directory. Slugs are read from the slug
/// map the last build left on disk.
pub fn write_feed(config: &Config, channel: &Channel) -> Result<PathBuf> {
    let feed = config.rss_feed.as_ref()
        .ok_or_else(|| anyhow!("No [rss_feed] section in the configuration"))?;
    let slugs = SlugIndex::load(&config.paths.slug_map)?;

    let xml = render_feed(feed, channel, &slugs)?;
    let path = config.output_dir.join(FEED_FILE);
    fs::write(&path, xml).with_context(|| format!("Error writing feed {}", path.display()))?;

    info!("Wrote feed {}", path.display());
    Ok(path)
}
