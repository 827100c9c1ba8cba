mod action;
mod app;
mod app_state;
mod card_config;
mod component;
mod components;
mod intake;
mod reveal;
mod theme;
mod widgets;
mod workflow;

use std::path::PathBuf;

use clap::Parser;

use sheetdrop_proto::client::{SelectedFile, UploadClient};
use sheetdrop_proto::config::Config;

/// Upload a spreadsheet to the processing service and watch the stats come in.
#[derive(Parser, Debug)]
#[command(name = "sheetdrop", version)]
struct Args {
    /// Base URL of the processing service (overrides the config file).
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Read settings from this file instead of the default config.toml.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Spreadsheet to submit right away.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = sheetdrop_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("sheetdrop.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("sheetdrop log: {}", log_path.display());

    tracing::info!("sheetdrop starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("config load failed, using defaults: {}", e);
            Config::default()
        }),
    };
    if let Some(server) = args.server {
        config.server.base_url = server;
    }

    let initial = match args.file {
        Some(path) if path.is_file() => Some(SelectedFile::from_path(path)),
        Some(path) => anyhow::bail!("not a file: {}", path.display()),
        None => None,
    };

    let client = UploadClient::new(&config.server.base_url)?;
    tracing::info!(
        "server {} downloads into {}",
        client.base_url(),
        config.paths.downloads_dir.display()
    );

    app::App::new(&config, client).run(initial).await
}
