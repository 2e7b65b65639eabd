//! Console configuration, read from environment variables.
//!
//! Every field has a default so the console runs with no configuration at
//! all.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::store::SqliteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Root directory for the database and logs.
    /// Env: `BROADCAST_DATA_DIR`
    /// Default: `./broadcast-console`
    pub data_dir: PathBuf,

    /// Database file name, relative to `data_dir` unless absolute.
    /// Env: `BROADCAST_DB_FILE`
    /// Default: `console.sqlite`
    pub database_file: PathBuf,

    /// Directory for the diagnostics log.
    /// Env: `BROADCAST_LOG_DIR`
    /// Default: `<data_dir>/logs`
    pub log_dir: PathBuf,

    /// Pause between send progress steps.
    /// Env: `BROADCAST_SEND_PACING_MS`
    /// Default: 200 ms
    pub send_pacing: Duration,

    /// Fixed seed for the delivery simulator.
    /// Env: `BROADCAST_SIMULATOR_SEED`
    /// Default: unset (seeded from entropy)
    pub simulator_seed: Option<u64>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./broadcast-console");
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            database_file: PathBuf::from("console.sqlite"),
            send_pacing: Duration::from_millis(200),
            simulator_seed: None,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = value("BROADCAST_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.log_dir = config.data_dir.join("logs");
        }
        if let Some(file) = value("BROADCAST_DB_FILE") {
            config.database_file = PathBuf::from(file);
        }
        if let Some(dir) = value("BROADCAST_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(raw) = value("BROADCAST_SEND_PACING_MS") {
            let ms: u64 = raw.parse().map_err(|_| {
                CoreError::InvalidArgument(format!("BROADCAST_SEND_PACING_MS is not a number: {}", raw))
            })?;
            config.send_pacing = Duration::from_millis(ms);
        }
        if let Some(raw) = value("BROADCAST_SIMULATOR_SEED") {
            let seed: u64 = raw.parse().map_err(|_| {
                CoreError::InvalidArgument(format!("BROADCAST_SIMULATOR_SEED is not a number: {}", raw))
            })?;
            config.simulator_seed = Some(seed);
        }
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}

/// Creates the configured directories and opens the store.
pub fn open_console(config: &ConsoleConfig) -> Result<SqliteStore, CoreError> {
    fs::create_dir_all(&config.data_dir)?;
    fs::create_dir_all(&config.log_dir)?;
    SqliteStore::open(config.database_path())
}
