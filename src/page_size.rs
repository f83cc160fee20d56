//! Estimates how many bytes a visitor downloads for a page and writes that
//! number into the page itself.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::CONTENT_LENGTH;
use spdlog::debug;

use crate::config::Config;

pub struct PageSizer {
    client: reqwest::Client,
    output_root: PathBuf,
    fallback: u64,
}

impl PageSizer {
    pub fn new(config: &Config) -> Result<PageSizer> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.build.probe_timeout_secs))
            .build()
            .context("Failed to create HTTP client for size probes")?;

        Ok(PageSizer {
            client,
            output_root: config.output_dir.clone(),
            fallback: config.build.fallback_resource_bytes,
        })
    }

    /// Compressed size of `html` plus the size of every distinct resource it
    /// references.
    pub async fn measure(&self, html: &str) -> Result<u64> {
        let page = gzip_size(html).context("Error compressing page")?;
        let sizes = join_all(resource_urls(html).into_iter().map(|url| self.resource_size(url))).await;
        Ok(page + sizes.iter().sum::<u64>())
    }

    async fn resource_size(&self, url: &str) -> u64 {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.remote_size(url).await;
        }
        if let Some(rest) = url.strip_prefix("//") {
            return self.remote_size(&format!("https://{}", rest)).await;
        }
        if url.starts_with("data:") {
            return 0;
        }
        self.local_size(url).await
    }

    async fn local_size(&self, url: &str) -> u64 {
        let path = local_path(&self.output_root, url);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!("Using fallback size for {}: {}", path.display(), e);
                self.fallback
            }
        }
    }

    async fn remote_size(&self, url: &str) -> u64 {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Using fallback size for {}: {}", url, e);
                return self.fallback;
            }
        };

        let length = response.headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        match length {
            Some(length) if response.status().is_success() => length,
            _ => {
                debug!("Using fallback size for {}: status {}, no usable length", url, response.status());
                self.fallback
            }
        }
    }
}

pub fn gzip_size(html: &str) -> io::Result<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(html.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(compressed.len() as u64)
}

/// `src` of images and scripts and `href` of link elements, deduplicated,
/// in order of appearance.
pub fn resource_urls(html: &str) -> Vec<&str> {
    lazy_static! {
        static ref RESOURCE_REGEX: Regex = Regex::new(
            r#"(?i)<(?:img|script)\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']|<link\b[^>]*?\shref\s*=\s*["']([^"']+)["']"#
        ).unwrap();
    }

    let mut seen = HashSet::new();
    RESOURCE_REGEX.captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty() && seen.insert(*url))
        .collect()
}

fn local_path(output_root: &Path, url: &str) -> PathBuf {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    output_root.join(url[..end].trim_start_matches('/'))
}

pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value < KB {
        format!("{} B", bytes)
    } else if value < MB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{:.1} MB", value / MB)
    }
}

/// Sets the text of every element carrying a `data-page-size` attribute.
pub fn annotate(html: &str, bytes: u64) -> String {
    lazy_static! {
        static ref SIZE_REGEX: Regex = Regex::new(
            r#"(<[A-Za-z][A-Za-z0-9]*\b[^>]*\sdata-page-size\b[^>]*>)[^<]*(</[A-Za-z][A-Za-z0-9]*\s*>)"#
        ).unwrap();
    }

    let size = human_size(bytes);
    SIZE_REGEX.replace_all(html, |caps: &regex::Captures| {
        format!("{}{}{}", &caps[1], size, &caps[2])
    }).into_owned()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::test_data;

    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(12_595), "12.3 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_annotate() {
        let html = r#"<footer>Updated <span class="size" data-page-size>?</span></footer>"#;
        assert_eq!(
            annotate(html, 2048),
            r#"<footer>Updated <span class="size" data-page-size>2.0 KB</span></footer>"#
        );

        let plain = "<footer>nothing to see</footer>";
        assert_eq!(annotate(plain, 2048), plain);
    }

    #[test]
    fn test_resource_urls() {
        let html = r#"<link rel="stylesheet" href="/assets/style.css"><img alt="x" src='/a.png'>
            <script src="/assets/filter.js"></script><img src="/a.png"><a href="/not-a-resource/">x</a>"#;
        assert_eq!(resource_urls(html), vec!["/assets/style.css", "/a.png", "/assets/filter.js"]);
    }

    #[test]
    fn test_gzip_size() {
        let html = "<p>repeat</p>".repeat(500);
        let size = gzip_size(&html).unwrap();
        assert!(size > 0);
        assert!(size < html.len() as u64);
    }

    #[tokio::test]
    async fn test_measure_local_resources() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/style.css"), "x".repeat(300)).unwrap();

        let sizer = PageSizer::new(&test_data::config(dir.path())).unwrap();
        let html = r#"<link href="/assets/style.css?v=2"><img src="/missing.png"><img src="data:image/png;base64,AA==">"#;

        let measured = sizer.measure(html).await.unwrap();
        assert_eq!(measured, gzip_size(html).unwrap() + 300 + 50_000);
    }
}
