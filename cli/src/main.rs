mod remote;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crawler_core::{BrowserClient, FetchConfig, HttpClient};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crawler")]
#[command(about = "Crawler CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a running crawler server to fetch a page
    Crawl {
        /// Page to fetch
        url: String,
        /// Server URL (default: http://localhost:18100)
        #[arg(long, default_value = "http://localhost:18100")]
        server: String,
        /// Passed through to the server
        #[arg(long)]
        force_browser: bool,
    },
    /// Fetch a page directly, without a server
    Fetch {
        /// Page to fetch
        url: String,
        /// JSON file with the outbound header/cookie set and limits
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            url,
            server,
            force_browser,
        } => {
            let data = remote::crawl(&server, &url, force_browser).await?;
            println!("{}", data.html);
        }
        Commands::Fetch { url, config } => {
            fetch(&url, config).await?;
        }
    }

    Ok(())
}

async fn fetch(url: &str, config: Option<PathBuf>) -> Result<()> {
    let html = match config {
        Some(path) => {
            let config = FetchConfig::from_file(path)?;
            let client = BrowserClient::new(config).context("Failed to build HTTP client")?;
            client.fetch_html(url).await
        }
        None => crawler_core::fetch_html(url).await,
    }
    .with_context(|| format!("Failed to crawl {}", url))?;

    println!("{}", html);

    Ok(())
}
