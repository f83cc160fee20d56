use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use spdlog::{debug, info, warn};

use crate::channel::{Channel, ContentItem};
use crate::config::Config;

const PRIMARY_TIMEOUT_SECS: u64 = 30;
const FALLBACK_TIMEOUT_SECS: u64 = 60;

#[derive(Deserialize)]
struct ContentsPage {
    #[serde(default)]
    contents: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct ChannelLength {
    #[serde(default)]
    length: usize,
}

/// Talks to the channel API. Every request goes through the primary
/// transport first and is retried once through the fallback transport.
pub struct ChannelClient {
    primary: reqwest::Client,
    fallback: reqwest::Client,
    api_base: String,
    token: String,
    per_page: u32,
}

impl ChannelClient {
    pub fn new(config: &Config) -> Result<Self> {
        let primary = reqwest::Client::builder()
            .timeout(Duration::from_secs(PRIMARY_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let fallback = reqwest::Client::builder()
            .timeout(Duration::from_secs(FALLBACK_TIMEOUT_SECS))
            .http1_only()
            .gzip(false)
            .build()
            .context("Failed to create fallback HTTP client")?;

        Ok(ChannelClient {
            primary,
            fallback,
            api_base: config.api.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            per_page: config.api.per_page.max(1),
        })
    }

    /// Fetches the channel record with every content item, following pages
    /// until the API returns a short one.
    pub async fn fetch_channel(&self, channel: &str) -> Result<Channel> {
        let url = self.channel_url(channel);
        let mut record: Channel = self.fetch_json(&url).await?;
        record.contents.clear();

        let mut page = 1;
        loop {
            let url = self.contents_url(channel, page);
            let batch: ContentsPage = self.fetch_json(&url).await?;
            let count = batch.contents.len();
            debug!("Fetched page {} of channel {}: {} items", page, channel, count);
            record.contents.extend(batch.contents);

            if count < self.per_page as usize {
                break;
            }
            page += 1;
        }

        info!("Fetched {} items from channel '{}'", record.contents.len(), record.title);
        Ok(record)
    }

    /// Fetches only the item count of the channel.
    pub async fn fetch_length(&self, channel: &str) -> Result<usize> {
        let url = self.channel_url(channel);
        let record: ChannelLength = self.fetch_json(&url).await?;
        Ok(record.length)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        match self.fetch_with(&self.primary, url).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Request to {} failed, retrying with fallback transport: {:#}", url, e);
                self.fetch_with(&self.fallback, url).await
                    .with_context(|| format!("Fallback request to {} failed", url))
            }
        }
    }

    async fn fetch_with<T: DeserializeOwned>(&self, client: &reqwest::Client, url: &str) -> Result<T> {
        let response = client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("HTTP {} error from {}: {}", status, url, error_text));
        }

        let json_text = response
            .text()
            .await
            .context("Failed to read response body")?;

        serde_json::from_str(&json_text)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    fn channel_url(&self, channel: &str) -> String {
        format!("{}/channels/{}", self.api_base, channel)
    }

    fn contents_url(&self, channel: &str, page: u32) -> String {
        format!("{}/channels/{}/contents?page={}&per={}", self.api_base, channel, page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::test_data;

    use super::*;

    fn config() -> Config {
        test_data::config(Path::new("dist"))
    }

    #[test]
    fn test_urls() {
        let client = ChannelClient::new(&config()).unwrap();
        assert_eq!(client.channel_url("field-notes"), "https://api.example.com/v2/channels/field-notes");
        assert_eq!(client.contents_url("field-notes", 3), "https://api.example.com/v2/channels/field-notes/contents?page=3&per=50");
    }

    #[test]
    fn test_contents_page_shape() {
        let json = r#"{"contents": [{"id": 7, "class": "Text", "content": "hi", "created_at": "2024-01-02T03:04:05Z", "updated_at": "2024-01-02T03:04:05Z"}]}"#;
        let page: ContentsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.contents.len(), 1);
        assert_eq!(page.contents[0].id, 7);
    }
}
