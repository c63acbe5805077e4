use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rssmerger::config::{Config, FeedList};
use rssmerger::feed::Fetcher;
use rssmerger::run::{deliver, run, OutputMode, RunResult};
use rssmerger::store::StateStore;

#[derive(Parser, Debug)]
#[command(
    name = "rssmerger",
    about = "Merges the items in a couple of RSS feeds to a single RSS feed.",
    long_about = "Merges the items in a couple of RSS feeds to a single RSS feed.\n\
                  Appearance of new items over time is remembered and added in the\n\
                  correct sequence.",
    disable_version_flag = true
)]
struct Args {
    /// Silent. Do not report errors in RSS files
    #[arg(short, long)]
    silent: bool,

    /// Output all new RSS items as SQL queries
    #[arg(short, long)]
    queries: bool,

    /// Only keep ITEMS rss items in merged list
    #[arg(short, long, value_name = "ITEMS")]
    items: Option<usize>,

    /// Be verbose
    #[arg(short, long)]
    verbose: bool,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Settings file (optional)
    #[arg(short, long, value_name = "FILE", default_value = "rssmerger.toml")]
    config: PathBuf,

    /// Feed list, a JSON object of identifier to URL [default: from settings, feeds.json]
    #[arg(short, long, value_name = "FILE")]
    feeds: Option<PathBuf>,
}

fn version_banner() -> String {
    format!(
        "rssmerger v{}\n\
         \n\
         This program is free software, distributed under the terms of the MIT license.\n\
         \n\
         This program is distributed in the hope that it will be useful,\n\
         but WITHOUT ANY WARRANTY; without even the implied warranty of\n\
         MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Diagnostics go to stderr so that `--queries` output stays clean.
/// `--silent` wins over everything, otherwise `RUST_LOG` wins over `--verbose`.
fn init_tracing(args: &Args) {
    let filter = if args.silent {
        EnvFilter::new("off")
    } else {
        let default = if args.verbose {
            "warn,rssmerger=debug"
        } else {
            "warn"
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn log_summary(result: &RunResult) {
    for report in &result.reports {
        match &report.result {
            Ok(new) => tracing::debug!(feed = %report.feed_id, new = new, "Feed done"),
            Err(e) => tracing::debug!(feed = %report.feed_id, error = %e, "Feed skipped"),
        }
    }

    let failed: Vec<&str> = result.failed_feeds().collect();
    if !failed.is_empty() {
        tracing::info!(failed = ?failed, "Some feeds were skipped and kept their previous watermark");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Invalid arguments print usage and exit with status 2
    let args = Args::parse();

    if args.version {
        print!("{}", version_banner());
        return Ok(());
    }

    init_tracing(&args);

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;

    let items_max = args.items.unwrap_or(config.items_max);
    let mode = if args.queries || config.queries {
        OutputMode::Queries
    } else {
        OutputMode::Feed
    };

    let feeds_path = args.feeds.as_ref().unwrap_or(&config.feeds_path);
    let feeds = FeedList::load(feeds_path)
        .with_context(|| format!("Failed to load feed list from {}", feeds_path.display()))?;
    if feeds.is_empty() {
        tracing::warn!(path = %feeds_path.display(), "No valid feeds found in feed list");
    }

    let store = StateStore::new(&config.merged_path, &config.seen_path);
    let prior = store.load().await;

    let fetcher = Fetcher::new().context("Failed to create HTTP client")?;
    let result = run(&fetcher, &feeds, prior, items_max).await;
    log_summary(&result);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    // Write failures are logged inside and never change the exit status
    deliver(&store, &result.outcome, mode, &mut out);

    Ok(())
}
