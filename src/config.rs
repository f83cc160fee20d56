use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const ENV_CHANNEL: &str = "ARENA_CHANNEL";
pub const ENV_TOKEN: &str = "ARENA_TOKEN";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL_SECS";
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
    pub slug_map: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            template_dir: PathBuf::from("res/template"),
            public_dir: PathBuf::from("res/public"),
            slug_map: PathBuf::from("slug-map.json"),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Build {
    /// Upper bound of item pages rendered and measured at the same time.
    pub workers: usize,
    pub probe_timeout_secs: u64,
    pub fallback_resource_bytes: u64,
}

impl Default for Build {
    fn default() -> Self {
        Build {
            workers: 8,
            probe_timeout_secs: 3,
            fallback_resource_bytes: 50_000,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Api {
    pub api_base: String,
    pub per_page: u32,
}

impl Default for Api {
    fn default() -> Self {
        Api {
            api_base: "https://api.are.na/v2".to_string(),
            per_page: 100,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RssFeed {
    pub title: String,
    pub site_url: String,
    pub description: String,
    pub page_size: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Poll {
    pub state_file: PathBuf,
    pub webhook_url: Option<String>,
}

impl Default for Poll {
    fn default() -> Self {
        Poll {
            state_file: PathBuf::from("last-count.txt"),
            webhook_url: None,
        }
    }
}

/// Everything read from `blocksite.toml`. Every section is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SiteFile {
    pub paths: Paths,
    pub build: Build,
    pub channel: Api,
    pub log: Option<Log>,
    pub rss_feed: Option<RssFeed>,
    pub poll: Poll,
}

/// Values that only come from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub channel: String,
    pub token: String,
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
    pub webhook_url: Option<String>,
}

impl Environment {
    /// Reads the environment through `lookup`, failing on the first missing
    /// required variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Environment>
        where F: Fn(&str) -> Option<String>
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("Missing required environment variable {}", key))
        };

        let channel = required(ENV_CHANNEL)?;
        let token = required(ENV_TOKEN)?;
        let output_dir = PathBuf::from(required(ENV_OUTPUT_DIR)?);

        let poll_interval = match lookup(ENV_POLL_INTERVAL) {
            Some(secs) => {
                let secs: u64 = secs.trim().parse()
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_POLL_INTERVAL, secs))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        let webhook_url = lookup(ENV_WEBHOOK_URL).filter(|v| !v.trim().is_empty());

        Ok(Environment {
            channel,
            token,
            output_dir,
            poll_interval,
            webhook_url,
        })
    }

    pub fn from_process() -> Result<Environment> {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

/// The process configuration. Built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub channel: String,
    pub token: String,
    pub api: Api,
    pub output_dir: PathBuf,
    pub paths: Paths,
    pub build: Build,
    pub log: Option<Log>,
    pub rss_feed: Option<RssFeed>,
    pub poll: Poll,
    pub poll_interval: Duration,
}

impl Config {
    pub fn new(site: SiteFile, env: Environment) -> Config {
        let mut poll = site.poll;
        if env.webhook_url.is_some() {
            poll.webhook_url = env.webhook_url;
        }

        Config {
            channel: env.channel,
            token: env.token,
            api: site.channel,
            output_dir: env.output_dir,
            paths: Paths {
                template_dir: parse_path(site.paths.template_dir),
                public_dir: parse_path(site.paths.public_dir),
                slug_map: parse_path(site.paths.slug_map),
            },
            build: site.build,
            log: site.log,
            rss_feed: site.rss_feed,
            poll: Poll {
                state_file: parse_path(poll.state_file),
                webhook_url: poll.webhook_url,
            },
            poll_interval: env.poll_interval,
        }
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }
    let Ok(cur_exe) = env::current_exe() else {
        return path;
    };
    let Some(exe_dir) = cur_exe.parent() else {
        return path;
    };
    match path.strip_prefix("${exe_dir}") {
        Ok(rest) => exe_dir.join(rest),
        Err(_) => path,
    }
}

pub fn parse_site_file(content: &str) -> Result<SiteFile> {
    toml::from_str::<SiteFile>(content).context("Error parsing configuration file")
}

pub fn read_site_file(cfg_path: &Path) -> Result<SiteFile> {
    let content = fs::read_to_string(cfg_path)
        .with_context(|| format!("Error opening configuration file {}", cfg_path.display()))?;
    parse_site_file(&content)
}

/// Loads the optional site file and overlays the process environment.
pub fn read_config(cfg_path: Option<&Path>) -> Result<Config> {
    let site = match cfg_path {
        Some(path) => read_site_file(path)?,
        None => SiteFile::default(),
    };
    let env = Environment::from_process()?;
    Ok(Config::new(site, env))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_environment_required() {
        let lookup = lookup_from(&[(ENV_CHANNEL, "my-channel"), (ENV_TOKEN, "secret")]);
        let err = Environment::from_lookup(lookup).unwrap_err();
        assert!(err.to_string().contains(ENV_OUTPUT_DIR));

        let lookup = lookup_from(&[(ENV_CHANNEL, "  "), (ENV_TOKEN, "secret"), (ENV_OUTPUT_DIR, "dist")]);
        let err = Environment::from_lookup(lookup).unwrap_err();
        assert!(err.to_string().contains(ENV_CHANNEL));
    }

    #[test]
    fn test_environment_defaults() {
        let lookup = lookup_from(&[(ENV_CHANNEL, "my-channel"), (ENV_TOKEN, "secret"), (ENV_OUTPUT_DIR, "dist")]);
        let env = Environment::from_lookup(lookup).unwrap();
        assert_eq!(env.channel, "my-channel");
        assert_eq!(env.output_dir, PathBuf::from("dist"));
        assert_eq!(env.poll_interval, Duration::from_secs(300));
        assert_eq!(env.webhook_url, None);
    }

    #[test]
    fn test_bad_poll_interval() {
        let lookup = lookup_from(&[
            (ENV_CHANNEL, "c"), (ENV_TOKEN, "t"), (ENV_OUTPUT_DIR, "dist"), (ENV_POLL_INTERVAL, "soon"),
        ]);
        assert!(Environment::from_lookup(lookup).is_err());
    }

    #[test]
    fn test_site_file() {
        let toml_str = r##"
[paths]
template_dir = "tpl"

[build]
workers = 2

[rss_feed]
title = "feed"
site_url = "https://example.com"
description = "desc"
page_size = 10

[log]
level = "Debug"
log_to_console = true
"##;
        let site = parse_site_file(toml_str).unwrap();
        assert_eq!(site.paths.template_dir, PathBuf::from("tpl"));
        assert_eq!(site.paths.public_dir, PathBuf::from("res/public"));
        assert_eq!(site.build.workers, 2);
        assert_eq!(site.build.probe_timeout_secs, 3);
        assert_eq!(site.channel.per_page, 100);
        assert_eq!(site.rss_feed.unwrap().page_size, 10);
        assert_eq!(site.log.unwrap().level, LogLevel::Debug);
    }

    #[test]
    fn test_webhook_env_overrides_file() {
        let site = parse_site_file("[poll]\nwebhook_url = \"https://file.example.com\"\n").unwrap();
        let lookup = lookup_from(&[
            (ENV_CHANNEL, "c"), (ENV_TOKEN, "t"), (ENV_OUTPUT_DIR, "dist"), (ENV_WEBHOOK_URL, "https://env.example.com"),
        ]);
        let config = Config::new(site, Environment::from_lookup(lookup).unwrap());
        assert_eq!(config.poll.webhook_url.as_deref(), Some("https://env.example.com"));
    }
}
