//! CLI entry point for the departure board.
//!
//! Provides subcommands for running the rotating board loop, serving the
//! request-driven HTTP interface, and printing one-shot estimates.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use departure_board::api::{self, ApiState};
use departure_board::board;
use departure_board::config::{Config, FeedGroup};
use departure_board::decode::decode_trip_departures;
use departure_board::departures::aggregate;
use departure_board::fetch::auth::ApiKey;
use departure_board::fetch::{BasicClient, HttpClient, fetch_bytes};
use departure_board::render::ConsoleRenderer;

#[derive(Parser)]
#[command(name = "departure_board")]
#[command(about = "A rotating departure board for one transit stop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rotating display loop for a stop
    Board {
        /// Base stop id to observe (the feed appends direction suffixes)
        #[arg(short, long, default_value = "D19")]
        stop: String,

        /// Route-group feed to poll
        #[arg(short, long, value_enum, default_value = "bdfm")]
        feed: FeedGroup,

        /// Seconds between feed refreshes
        #[arg(long, default_value_t = 30)]
        refresh: u64,

        /// Seconds between slide rotations
        #[arg(long, default_value_t = 10)]
        rotate: u64,
    },
    /// Serve departures over HTTP (GET /departures/{stop_id})
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "0.0.0.0:3000")]
        bind: String,

        /// Route-group feed to query
        #[arg(short, long, value_enum, default_value = "bdfm")]
        feed: FeedGroup,
    },
    /// Print departure estimates for a stop once and exit
    Estimates {
        /// Path to a feed file or URL to fetch; defaults to the live feed
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Base stop id to aggregate for
        #[arg(short, long, default_value = "D19")]
        stop: String,

        /// Route-group feed to query when no source is given
        #[arg(short, long, value_enum, default_value = "bdfm")]
        feed: FeedGroup,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/departure_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("departure_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Board {
            stop,
            feed,
            refresh,
            rotate,
        } => {
            let mut config = Config::new(feed, stop);
            config.refresh_interval = Duration::from_secs(refresh);
            config.rotate_interval = Duration::from_secs(rotate);

            // The board loop cannot answer anything without a credential
            let key = config.require_api_key()?.to_string();
            let client: Arc<dyn HttpClient> = Arc::new(ApiKey::x_api_key(BasicClient::new(), &key)?);

            let (stop_tx, stop_rx) = oneshot::channel();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                let _ = stop_tx.send(());
            });

            board::run(config, client, ConsoleRenderer, stop_rx).await;
        }
        Commands::Serve { bind, feed } => {
            let state = ApiState::new(Config::new(feed, "D19".to_string()));
            let app = api::router(state);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!(addr = %bind, "Serving departures");
            axum::serve(listener, app).await?;
        }
        Commands::Estimates { source, stop, feed } => {
            let config = Config::new(feed, stop);
            let bytes = fetch_source(&config, source.as_deref()).await?;

            let records = decode_trip_departures(&bytes)?;
            let now = Utc::now().timestamp();
            let estimates = aggregate(&records, &config.stop_id, now, config.horizon_secs);

            println!("{}", serde_json::to_string_pretty(&estimates)?);
        }
    }

    Ok(())
}

/// Loads feed bytes from a local file path or fetches them over HTTP with
/// the configured credential.
#[tracing::instrument(skip(config))]
async fn fetch_source(config: &Config, source: Option<&str>) -> Result<Bytes> {
    match source {
        Some(path) if !path.starts_with("http") => Ok(std::fs::read(path)?.into()),
        other => {
            let key = config.require_api_key()?;
            let client = ApiKey::x_api_key(BasicClient::new(), key)?;
            let url = other.unwrap_or(config.feed_url.as_str());
            Ok(fetch_bytes(&client, url).await?)
        }
    }
}
