//! `embedscout` CLI - resolve video embeds into playable streams

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use embedscout::ResolverConfig;

#[derive(Parser)]
#[command(name = "embedscout")]
#[command(about = "Resolve third-party video embeds into directly playable streams")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/embedscout/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-fetch timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum redelegation depth for wrapper hosts
    #[arg(long, global = true)]
    depth: Option<usize>,

    /// Number of embeds resolved concurrently
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve embed URLs into stream descriptors
    Resolve {
        /// Embed URLs, in page order
        #[arg(required_unless_present = "embeds_file")]
        embeds: Vec<String>,

        /// Content page the embeds were found on (sent as Referer)
        #[arg(short, long)]
        page: Option<String>,

        /// Read embed URLs from a file, one per line
        #[arg(long)]
        embeds_file: Option<PathBuf>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which strategy would handle a URL
    Dispatch {
        /// Embed URL
        url: String,
    },

    /// List registered strategies and the hosts they claim
    Hosts,
}

/// How results are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("EMBEDSCOUT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(cli: &Cli) -> Result<ResolverConfig> {
    let mut config = match &cli.config {
        Some(path) => ResolverConfig::load_from(path)?,
        None => ResolverConfig::load()?,
    };
    if let Some(secs) = cli.timeout {
        config.fetch_timeout_secs = secs;
    }
    if let Some(depth) = cli.depth {
        config.max_depth = depth;
    }
    if let Some(n) = cli.concurrency {
        config.max_concurrency = n;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Resolve {
            embeds,
            page,
            embeds_file,
            json,
        } => {
            let format = if json { OutputFormat::Json } else { OutputFormat::Text };
            cmd::resolve::cmd_resolve(&config, embeds, embeds_file.as_deref(), page.as_deref(), format).await?;
        }
        Commands::Dispatch { url } => {
            cmd::hosts::cmd_dispatch(&config, &url);
        }
        Commands::Hosts => {
            cmd::hosts::cmd_hosts(&config);
        }
    }

    Ok(())
}
