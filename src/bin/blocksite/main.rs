use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use spdlog::{info, warn};

use blocksite::channel::client::ChannelClient;
use blocksite::config::Config;
use blocksite::feed::write_feed;
use blocksite::logger::configure_logger;
use blocksite::poller::{PollOutcome, Poller};
use blocksite::site_builder::build_site;

use crate::bootstrap::bootstrap_cmd;
use crate::config::open_config;

mod bootstrap;
mod config;
mod decompress;

const CFG_FILE_NAME: &str = "blocksite.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the channel and write the site into OUTPUT_DIR
    Build,
    /// Write rss.xml using the slug map of the last build
    Feed,
    /// Call the rebuild webhook whenever the channel item count changes
    Poll(PollArgs),
    /// Write default templates, public files and a sample config
    Init(InitArgs),
}

#[derive(Parser, Debug)]
struct PollArgs {
    /// Check once and exit
    #[arg(long)]
    once: bool,
}

#[derive(Parser, Debug)]
pub(crate) struct InitArgs {
    /// Directory where the site resources will be written
    #[arg(short, long)]
    out_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let command = match args.command {
        Command::Init(init_args) => return bootstrap_cmd(init_args),
        command => command,
    };

    let config = open_config(args.config_path.map(PathBuf::from))?;
    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    match command {
        Command::Build => build_cmd(&config).await,
        Command::Feed => feed_cmd(&config).await,
        Command::Poll(poll_args) => poll_cmd(&config, poll_args).await,
        Command::Init(_) => Ok(()),
    }
}

async fn build_cmd(config: &Config) -> Result<()> {
    info!("Building channel '{}' into {}", config.channel, config.output_dir.display());
    let client = ChannelClient::new(config)?;
    let channel = client.fetch_channel(&config.channel).await?;

    build_site(config, &channel).await?;

    if config.rss_feed.is_some() {
        write_feed(config, &channel)?;
    }
    Ok(())
}

async fn feed_cmd(config: &Config) -> Result<()> {
    let client = ChannelClient::new(config)?;
    let channel = client.fetch_channel(&config.channel).await?;
    write_feed(config, &channel)?;
    Ok(())
}

async fn poll_cmd(config: &Config, args: PollArgs) -> Result<()> {
    let poller = Poller::new(config)?;
    if !args.once {
        return poller.run().await;
    }

    match poller.check().await? {
        PollOutcome::Unchanged => info!("No change"),
        PollOutcome::Triggered { previous, current } => info!("Rebuild triggered ({:?} -> {})", previous, current),
        PollOutcome::WebhookFailed { current } => warn!("Rebuild not triggered for count {}", current),
    }
    Ok(())
}
