//! tsubin server binary.
//!
//!   RUST_LOG=info tsubin --config config.json
//!
//! Send SIGHUP to reload the config file without restarting.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsubin::{AppState, Config, PasteStore, Server, SharedConfig, api, config};

#[derive(Debug, Parser)]
#[command(name = "tsubin", version, about = "A minimal self-hosted pastebin")]
struct Args {
    /// Path to the JSON config file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Overrides `PastesDir` from the config file.
    #[arg(long)]
    pastes_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config).context("loading configuration")?;
    if let Some(dir) = args.pastes_dir {
        cfg.pastes_dir = dir;
    }
    info!(path = %args.config.display(), version = %cfg.version, "loaded configuration");

    let store = PasteStore::open(&cfg.pastes_dir)
        .with_context(|| format!("opening pastes directory {}", cfg.pastes_dir.display()))?;
    let shared = SharedConfig::new(cfg.clone());

    tokio::spawn(config::reload_on_hangup(shared.clone(), args.config.clone()));

    let app = api::router(AppState { store, config: shared });

    if cfg.sweep_interval_secs > 0 {
        let every = Duration::from_secs(cfg.sweep_interval_secs);
        info!(every_secs = cfg.sweep_interval_secs, "background sweep enabled");
        tokio::spawn(api::sweep_every(Arc::clone(app.state()), every));
    }

    Server::bind(cfg.addr()).serve(app).await?;
    Ok(())
}
