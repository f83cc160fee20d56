//! Watches the channel item count and calls a rebuild webhook when it moves.
//!
//! Only additions and removals are noticed. Edits to existing items keep the
//! count unchanged and do not trigger a rebuild.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use spdlog::{debug, error, info};

use crate::channel::client::ChannelClient;
use crate::config::Config;

const WEBHOOK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    Unchanged,
    /// The webhook was called and the new count stored.
    Triggered { previous: Option<usize>, current: usize },
    /// The webhook failed. The stored count is left alone so the next check
    /// tries again.
    WebhookFailed { current: usize },
}

/// Reads the last seen count. A missing or unreadable state file means no
/// count has been seen yet.
pub fn read_count(path: &Path) -> Result<Option<usize>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text.trim().parse().ok()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Error reading poll state {}", path.display())),
    }
}

pub fn write_count(path: &Path, count: usize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Error creating directory {}", parent.display()))?;
    }
    fs::write(path, count.to_string())
        .with_context(|| format!("Error writing poll state {}", path.display()))
}

pub fn has_changed(previous: Option<usize>, current: usize) -> bool {
    previous != Some(current)
}

pub struct Poller<'a> {
    config: &'a Config,
    client: ChannelClient,
    http: reqwest::Client,
    webhook_url: String,
}

impl<'a> Poller<'a> {
    pub fn new(config: &'a Config) -> Result<Poller<'a>> {
        let webhook_url = config.poll.webhook_url.clone()
            .ok_or_else(|| anyhow!("No webhook url configured. Set WEBHOOK_URL or [poll] webhook_url"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for the webhook")?;

        Ok(Poller {
            config,
            client: ChannelClient::new(config)?,
            http,
            webhook_url,
        })
    }

    /// Runs one check. Fetch and state file errors are returned, webhook
    /// errors are reported in the outcome.
    pub async fn check(&self) -> Result<PollOutcome> {
        let state_file = &self.config.poll.state_file;
        let current = self.client.fetch_length(&self.config.channel).await?;
        let previous = read_count(state_file)?;

        if !has_changed(previous, current) {
            debug!("Channel '{}' still has {} items", self.config.channel, current);
            return Ok(PollOutcome::Unchanged);
        }

        info!("Channel '{}' item count changed from {:?} to {}", self.config.channel, previous, current);
        if let Err(e) = self.trigger().await {
            error!("Rebuild webhook failed: {:#}", e);
            return Ok(PollOutcome::WebhookFailed { current });
        }

        write_count(state_file, current)?;
        Ok(PollOutcome::Triggered { previous, current })
    }

    async fn trigger(&self) -> Result<()> {
        let response = self.http.post(&self.webhook_url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.webhook_url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} from {}", response.status(), self.webhook_url));
        }
        info!("Rebuild webhook accepted with {}", response.status());
        Ok(())
    }

    /// Checks every poll interval until the process is stopped. Failed checks
    /// are logged and retried on the next tick.
    pub async fn run(&self) -> Result<()> {
        info!("Polling channel '{}' every {} seconds", self.config.channel, self.config.poll_interval.as_secs());
        loop {
            if let Err(e) = self.check().await {
                error!("Poll failed: {:#}", e);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
