//! ozon-sellers - Proxy-rotating crawler for Ozon seller disclosures
//!
//! Collects one record per seller from a category listing.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ozon_sellers::commands::{CrawlCommand, ProxiesCommand};
use ozon_sellers::config::{Config, OutputFormat};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ozon-sellers",
    version,
    about = "Collect seller disclosures from an Ozon category",
    long_about = "Walks an Ozon category listing through a rotating proxy pool and extracts one deduplicated seller record per seller."
)]
struct Cli {
    /// Proxy list file (host:port or host:port:user:pass per line)
    #[arg(short, long, global = true, env = "OZON_PROXIES")]
    proxies: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a category and list its sellers
    #[command(alias = "c")]
    Crawl {
        /// Category URL, e.g. https://www.ozon.ru/category/noutbuki-15692/
        url: String,

        /// Listing pages to walk (0 = until an empty page)
        #[arg(short, long)]
        max_pages: Option<u32>,

        /// Maximum concurrent product fetches (0 = unbounded)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Show the parsed proxy list
    Proxies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(proxies) = cli.proxies {
        config.proxy_file = proxies;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    match cli.command {
        Commands::Crawl { url, max_pages, concurrency } => {
            if let Some(pages) = max_pages {
                config.max_pages = pages;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }

            let cmd = CrawlCommand::new(config);
            let output = cmd.execute(&url).await?;
            println!("{}", output);
        }

        Commands::Proxies => {
            let output = ProxiesCommand::new(config).execute()?;
            println!("{}", output);
        }
    }

    Ok(())
}
