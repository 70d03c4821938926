//! Run configuration: TOML file loading and fatal startup validation.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::Result;

/// Defaults for optional config fields.
struct Defaults;

impl Defaults {
    pub const TABLE: &'static str = "plays";
    pub const MAX_MULTI_INSERT: usize = 100;
}

/// Top-level run configuration, loaded from a TOML file.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Number of queues and consumer workers.
    pub pipeline_count: usize,
    /// Bounded capacity of each queue in rows; the producer blocks when a
    /// queue is full.
    pub queue_capacity: usize,
    /// Enable debug-level logging (per-row push and drain traces).
    #[serde(default)]
    pub debug: bool,
    pub database: DatabaseConfig,
}

/// Sink connection parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file. Each worker opens its own connection to it.
    pub path: PathBuf,
    /// Destination table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Maximum rows per multi-row insert statement.
    #[serde(default = "default_max_multi_insert")]
    pub max_multi_insert: usize,
}

fn default_table() -> String {
    Defaults::TABLE.to_string()
}

fn default_max_multi_insert() -> usize {
    Defaults::MAX_MULTI_INSERT
}

/// Load configuration from `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let config: Config =
        toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))?;
    Ok(config)
}

impl Config {
    /// Reject sizes the pipeline cannot be built with. Fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline_count == 0 {
            bail!("invalid pipeline_count: 0");
        }
        if self.queue_capacity == 0 {
            bail!("invalid queue_capacity: 0");
        }
        if self.database.max_multi_insert == 0 {
            bail!("invalid max_multi_insert: 0");
        }
        Ok(())
    }
}
