//! Configuration file and the process-wide reloadable snapshot.
//!
//! The file is JSON with PascalCase keys:
//!
//! ```json
//! { "Version": "1.0", "Host": "127.0.0.1", "Port": 3000, "MaxSize": 1048576,
//!   "Debug": false, "PastesDir": "pastes", "SweepIntervalSecs": 0 }
//! ```
//!
//! Unknown keys are ignored. Readers take a [`SharedConfig::snapshot`], an
//! `Arc<Config>` that never changes underneath them; a reload parses the whole
//! file first and only then swaps the pointer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    pub version: String,
    pub host: String,
    pub port: u16,
    /// Largest accepted paste, in bytes.
    pub max_size: usize,
    /// Enables per-request access logging.
    pub debug: bool,
    pub pastes_dir: PathBuf,
    /// Background sweep period; `0` leaves expiration purely lazy.
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            host: "127.0.0.1".to_owned(),
            port: 3000,
            max_size: 1024 * 1024,
            debug: false,
            pastes_dir: PathBuf::from("pastes"),
            sweep_interval_secs: 0,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("open {}: {e}", path.display())))?;
        Self::from_json(&text)
            .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// `host:port`, suitable for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Cheaply cloneable handle to the current configuration.
#[derive(Clone, Debug)]
pub struct SharedConfig {
    current: Arc<RwLock<Arc<Config>>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(config))) }
    }

    pub fn snapshot(&self) -> Arc<Config> {
        self.current.read().clone()
    }

    pub fn replace(&self, config: Config) {
        *self.current.write() = Arc::new(config);
    }

    /// Re-reads `path`. On failure the previous snapshot stays in place.
    pub fn reload(&self, path: &Path) -> Result<()> {
        let fresh = Config::load(path)?;
        self.replace(fresh);
        Ok(())
    }
}

/// Reloads `path` into `shared` on every SIGHUP. Runs until the process exits.
#[cfg(unix)]
pub async fn reload_on_hangup(shared: SharedConfig, path: PathBuf) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            warn!("could not install SIGHUP handler, config reload disabled: {e}");
            return;
        }
    };
    while hangups.recv().await.is_some() {
        match shared.reload(&path) {
            Ok(()) => info!(path = %path.display(), "reloaded configuration"),
            Err(e) => warn!("config reload failed, keeping previous: {e}"),
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(_shared: SharedConfig, _path: PathBuf) {
    std::future::pending::<()>().await
}
