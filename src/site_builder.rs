use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use spdlog::{debug, info};
use walkdir::WalkDir;

use crate::channel::Channel;
use crate::config::Config;
use crate::page_size::{annotate, PageSizer};
use crate::slug_map::{remove_side_file, SlugEntry, SlugMap};
use crate::template::Templates;
use crate::view::home_renderer::render_home;
use crate::view::item_renderer::render_item;
use crate::view::not_found::render_not_found;

/// Entries of an existing output directory that survive a rebuild.
const PRESERVED_ENTRIES: [&str; 2] = [".git", "node_modules"];
const ASSETS_DIR: &str = "assets";
const INDEX_FILE: &str = "index.html";
const NOT_FOUND_FILE: &str = "404.html";

#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    /// Items in the channel.
    pub items: usize,
    /// HTML pages written, home and 404 included.
    pub pages: usize,
    /// Items whose slug was taken over by a later item.
    pub collisions: usize,
}

struct SiteBuilder<'a> {
    config: &'a Config,
    channel: &'a Channel,
    slug_map: SlugMap<'a>,
    templates: Templates,
    sizer: PageSizer,
}

/// Writes the whole site for `channel` into the configured output directory.
/// Any failure aborts the build.
pub async fn build_site(config: &Config, channel: &Channel) -> Result<BuildSummary> {
    let output_dir = &config.output_dir;

    // A build that stops half way must not leave the previous slugs behind
    remove_side_file(&config.paths.slug_map)?;

    info!("Preparing output directory {}", output_dir.display());
    prepare_output_dir(output_dir)?;

    info!("Copying static files from {}", config.paths.public_dir.display());
    copy_dir(&config.paths.public_dir, output_dir)?;

    let templates = Templates::load(&config.paths.template_dir)?;
    let builder = SiteBuilder {
        config,
        channel,
        slug_map: SlugMap::build(&channel.contents),
        templates,
        sizer: PageSizer::new(config)?,
    };

    let summary = builder.run().await?;
    info!("Build finished: {} items, {} pages, {} slug collisions",
        summary.items, summary.pages, summary.collisions);
    Ok(summary)
}

impl<'a> SiteBuilder<'a> {
    async fn run(&self) -> Result<BuildSummary> {
        let output_dir = &self.config.output_dir;

        info!("Writing home page");
        let home = render_home(self.channel, &self.slug_map, &self.templates);
        self.write_page(&output_dir.join(INDEX_FILE), home).await?;

        info!("Writing {} item pages", self.slug_map.len());
        let workers = self.config.build.workers.max(1);
        let written: Vec<PathBuf> = stream::iter(self.slug_map.entries())
            .map(|entry| self.write_item(entry))
            .buffer_unordered(workers)
            .try_collect()
            .await?;

        info!("Writing not found page");
        let not_found = render_not_found(self.channel, &self.slug_map, &self.templates);
        self.write_page(&output_dir.join(NOT_FOUND_FILE), not_found).await?;

        info!("Writing slug map to {}", self.config.paths.slug_map.display());
        self.slug_map.persist(&self.config.paths.slug_map)?;

        Ok(BuildSummary {
            items: self.channel.contents.len(),
            pages: written.len() + 2,
            collisions: self.slug_map.collisions().len(),
        })
    }

    async fn write_item(&self, entry: &SlugEntry<'a>) -> Result<PathBuf> {
        let dir = self.config.output_dir.join(entry.slug.as_str());
        tokio::fs::create_dir_all(&dir).await
            .with_context(|| format!("Error creating directory {}", dir.display()))?;

        let html = render_item(self.channel, &self.slug_map, &self.templates, entry.item);
        let path = dir.join(INDEX_FILE);
        self.write_page(&path, html).await?;
        Ok(path)
    }

    async fn write_page(&self, path: &Path, html: String) -> Result<()> {
        let bytes = self.sizer.measure(&html).await?;
        let html = annotate(&html, bytes);
        tokio::fs::write(path, html).await
            .with_context(|| format!("Error writing page {}", path.display()))?;
        debug!("Wrote {} ({} bytes to download)", path.display(), bytes);
        Ok(())
    }
}

/// Empties `output_dir` except for version control and dependency caches, or
/// creates it, and makes sure the assets directory exists.
pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        let entries = fs::read_dir(output_dir)
            .with_context(|| format!("Error reading output directory {}", output_dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if PRESERVED_ENTRIES.iter().any(|name| entry.file_name() == *name) {
                continue;
            }
            let path = entry.path();
            let removed = if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.with_context(|| format!("Error removing {}", path.display()))?;
        }
    } else {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Error creating output directory {}", output_dir.display()))?;
    }

    let assets = output_dir.join(ASSETS_DIR);
    fs::create_dir_all(&assets)
        .with_context(|| format!("Error creating directory {}", assets.display()))?;
    Ok(())
}

/// Copies the tree under `src` into `dst`, overwriting existing files.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("Error walking {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Error creating directory {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Error copying {} to {}", entry.path().display(), target.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_data;

    use super::*;

    fn site_config(root: &Path) -> Config {
        let template_dir = root.join("template");
        let public_dir = root.join("public");
        fs::create_dir_all(&template_dir).unwrap();
        fs::create_dir_all(public_dir.join("assets")).unwrap();
        test_data::write_templates(&template_dir);
        fs::write(public_dir.join("assets").join("style.css"), "body {}").unwrap();
        fs::write(public_dir.join("robots.txt"), "User-agent: *").unwrap();

        let mut config = test_data::config(&root.join("dist"));
        config.paths.template_dir = template_dir;
        config.paths.public_dir = public_dir;
        config.paths.slug_map = root.join("slug-map.json");
        config.build.workers = 2;
        config
    }

    /// The fixture channel without remote images, so no size probe leaves the machine.
    fn offline_channel() -> Channel {
        let mut channel = test_data::channel();
        for item in channel.contents.iter_mut() {
            item.image = None;
        }
        channel
    }

    #[test]
    fn test_prepare_keeps_vcs_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        fs::create_dir_all(out.join(".git")).unwrap();
        fs::write(out.join(".git").join("HEAD"), "ref").unwrap();
        fs::create_dir_all(out.join("node_modules").join("pkg")).unwrap();
        fs::create_dir_all(out.join("old-item")).unwrap();
        fs::write(out.join("old-item").join("index.html"), "old").unwrap();
        fs::write(out.join("index.html"), "old").unwrap();

        prepare_output_dir(out).unwrap();

        assert!(out.join(".git").join("HEAD").exists());
        assert!(out.join("node_modules").join("pkg").exists());
        assert!(!out.join("old-item").exists());
        assert!(!out.join("index.html").exists());
        assert!(out.join("assets").is_dir());
    }

    #[test]
    fn test_prepare_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a").join("b");
        prepare_output_dir(&out).unwrap();
        assert!(out.join("assets").is_dir());
    }

    #[tokio::test]
    async fn test_build_site() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());
        let channel = offline_channel();

        let summary = build_site(&config, &channel).await.unwrap();
        assert_eq!(summary, BuildSummary { items: 6, pages: 8, collisions: 0 });

        let out = &config.output_dir;
        assert_eq!(fs::read_to_string(out.join("robots.txt")).unwrap(), "User-agent: *");
        assert!(out.join("assets").join("style.css").exists());
        assert!(out.join("404.html").exists());
        for slug in ["hello-world", "sunset", "a-language-empowering-everyone", "field-guide", "notes", "untitled-106"] {
            assert!(out.join(slug).join("index.html").exists(), "{}", slug);
        }

        let home = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(!home.contains("<span data-page-size>?</span>"));
        assert!(home.contains(" KB</span>") || home.contains(" B</span>"));

        let index = crate::slug_map::SlugIndex::load(&config.paths.slug_map).unwrap();
        assert_eq!(index.slug_for(102).map(|s| s.as_str()), Some("sunset"));
    }

    #[tokio::test]
    async fn test_build_with_collision() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());
        let mut channel = offline_channel();
        channel.contents[1].title = Some("Hello World".to_string());

        let summary = build_site(&config, &channel).await.unwrap();
        assert_eq!(summary, BuildSummary { items: 6, pages: 7, collisions: 1 });

        let page = fs::read_to_string(config.output_dir.join("hello-world").join("index.html")).unwrap();
        assert!(page.contains("item-image"));
    }

    #[tokio::test]
    async fn test_missing_templates_abort() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = site_config(dir.path());
        config.paths.template_dir = dir.path().join("nowhere");
        fs::write(&config.paths.slug_map, r#"{"stale":{"id":1,"title":"x","class":"Text","originalTitle":null}}"#).unwrap();

        assert!(build_site(&config, &offline_channel()).await.is_err());
        assert!(!config.paths.slug_map.exists());
    }
}
