//! Wayback-Archiver main entry point
//!
//! This is the command-line interface for archiving a user's posts and media
//! from Wayback Machine snapshots.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wayback_archiver::archive::{archive_media, archive_posts, generate_list};
use wayback_archiver::config::{load_config_with_hash, Config};
use wayback_archiver::engine::{
    build_http_client, Fetcher, JsonLinesProgress, LogProgress, ProgressSink, ReqwestFetcher,
};
use wayback_archiver::output::print_summary;

/// Wayback-Archiver: restore a user's posts and media from the Wayback Machine
///
/// Typical use is `list`, then `download`, then `image`. Every step can be
/// re-run safely; files that already exist are never fetched again.
#[derive(Parser, Debug)]
#[command(name = "wayback-archiver")]
#[command(version)]
#[command(about = "Archive posts and media from Wayback Machine snapshots", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Print progress events as JSON lines on stdout
    #[arg(long, global = true)]
    json_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the CDX API and save the snapshot list for a user
    List {
        username: String,
    },

    /// Download every post in a snapshot list
    Download {
        /// Snapshot list produced by `list`
        list_file: PathBuf,
        username: String,
    },

    /// Download media referenced by a user's archived posts
    Image {
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let client = build_http_client(&config.http).context("Failed to build HTTP client")?;

    match cli.command {
        Command::List { username } => {
            let path = generate_list(&client, &config, &username)
                .await
                .context("Failed to generate list")?;
            println!("List file: {}", path.display());
            println!(
                "Next step: wayback-archiver download {} {}",
                path.display(),
                username
            );
        }
        Command::Download {
            list_file,
            username,
        } => {
            let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(client));
            let progress = progress_sink(cli.json_progress);
            let summary = archive_posts(&config, fetcher, &list_file, &username, &*progress)
                .await
                .with_context(|| format!("Failed to download posts from {}", list_file.display()))?;
            if !cli.json_progress {
                print_summary("Post Download", &summary);
            }
        }
        Command::Image { username } => {
            let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(client));
            let progress = progress_sink(cli.json_progress);
            let summary = archive_media(&config, fetcher, &username, &*progress)
                .await
                .context("Failed to process media")?;
            if !cli.json_progress {
                print_summary("Media Download", &summary);
            }
        }
    }

    Ok(())
}

fn progress_sink(json: bool) -> Box<dyn ProgressSink> {
    if json {
        Box::new(JsonLinesProgress::new(std::io::stdout()))
    } else {
        Box::new(LogProgress)
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that `--json-progress` output on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wayback_archiver=info,warn"),
            1 => EnvFilter::new("wayback_archiver=debug,info"),
            2 => EnvFilter::new("wayback_archiver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
