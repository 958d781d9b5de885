use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod config;
mod enhance;
mod error;
mod fetch;
mod history;
mod server;

#[derive(Parser, Debug)]
#[command(name = "olliverse-server")]
#[command(about = "Manga/manhwa discovery and reading backend for OlliVerse")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OLLIVERSE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OLLIVERSE_PORT", default_value = "8790")]
    pub port: u16,

    /// Base URL of the upstream catalog API
    #[arg(long, env = "OLLIVERSE_CATALOG_URL", default_value = "https://api.mangadex.org")]
    pub catalog_url: String,

    /// Base URL of the upstream cover/upload host
    #[arg(long, env = "OLLIVERSE_UPLOADS_URL", default_value = "https://uploads.mangadex.org")]
    pub uploads_url: String,

    /// Referer header sent with upstream image fetches
    #[arg(long, env = "OLLIVERSE_REFERER", default_value = "https://mangadex.org/")]
    pub referer: String,

    /// Timeout for upstream requests, in seconds
    #[arg(long, env = "OLLIVERSE_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Maximum upscale factor accepted by the enhance endpoint
    #[arg(long, env = "OLLIVERSE_MAX_SCALE", default_value = "3.0")]
    pub max_scale: f32,

    /// Path to the reading-history JSON file (defaults to the platform data dir)
    #[arg(long, env = "OLLIVERSE_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,

    /// Maximum number of reading-history entries kept
    #[arg(long, env = "OLLIVERSE_HISTORY_CAPACITY", default_value = "20")]
    pub history_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting olliverse-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Catalog upstream: {}", config.catalog_url);
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
