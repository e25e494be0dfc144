use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedrelay::config::{Config, DEFAULT_CONFIG_PATH};
use feedrelay::relay::IrcRelay;
use feedrelay::source::RssSource;
use feedrelay::watermark::FileWatermarkStore;

/// Relay new RSS status-feed entries to IRC, once.
///
/// Meant to be run from cron; each invocation polls every topic and exits.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory holding `<topic>.latest` files (overrides `StateDir`)
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // -- configuration -------------------------------------------------------
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    // -- collaborators -------------------------------------------------------
    let source = RssSource::new(&config.feed_url_template, config.fetch_timeout())?;
    let store = FileWatermarkStore::new(&config.state_dir);
    let relay = IrcRelay::new(
        &config.irc_server,
        &config.irc_nickname,
        config.session_options(),
    );

    info!(
        topics = config.topics.len(),
        state_dir = %store.dir().display(),
        "starting run"
    );

    // -- one pass ------------------------------------------------------------
    let report = feedrelay::run_once(
        &config.topics,
        &config.channels,
        &source,
        &store,
        &relay,
        &Utc::now,
    )
    .context("run aborted")?;

    info!(
        polled = report.topics_polled,
        skipped = report.topics_skipped,
        delivered = report.lines_delivered,
        "run finished"
    );
    Ok(())
}
