//! Minesduel terminal client entry point.

mod app;
mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use minesduel_store::{Client, HttpStore};
use minesduel_sync::Difficulty;

use crate::app::{App, Request};
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(version, about = "Two-player minesweeper over a shared document store", long_about = None)]
struct Args {
    /// Configuration file (defaults to the platform config path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document store root URL, overriding the configuration file
    #[arg(short, long)]
    store_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host a new game and wait for an opponent
    Host {
        /// Preset board: easy, medium or hard
        #[arg(short, long, default_value = "easy")]
        mode: Difficulty,

        /// Custom board width (needs --height and --bombs)
        #[arg(long, requires_all = ["height", "bombs"])]
        width: Option<usize>,

        /// Custom board height
        #[arg(long, requires_all = ["width", "bombs"])]
        height: Option<usize>,

        /// Custom mine count
        #[arg(long, requires_all = ["width", "height"])]
        bombs: Option<usize>,
    },
    /// Join a random queued game
    Join,
}

impl Command {
    fn into_request(self) -> Request {
        match self {
            Command::Host {
                width: Some(width),
                height: Some(height),
                bombs: Some(bombs),
                ..
            } => Request::Host(Difficulty::Custom {
                width,
                height,
                bombs,
            }),
            Command::Host { mode, .. } => Request::Host(mode),
            Command::Join => Request::Join,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let filter = loaded
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| "info".into());

    // Logs go to stderr; stdout carries the boards.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting minesduel");

    let mut config = match loaded {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            AppConfig::default()
        }
    };
    if let Some(url) = args.store_url {
        config.store_url = url;
    }
    if config.store_url.is_empty() {
        anyhow::bail!("no document store configured; pass --store-url or set store_url in the config file");
    }

    let store = HttpStore::new(&config.store_url).context("failed to build store client")?;
    let client = Client::new(Arc::new(store)).with_timeout(config.call_timeout());
    tracing::info!(store = %config.store_url, game = %config.game_name, "store configured");

    App::new(client, config.session_config())
        .run(args.command.into_request())
        .await
}
