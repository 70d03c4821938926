//! Shared utilities: logging and configuration.

pub mod config;
pub mod logger;

pub use config::{Config, DatabaseConfig, load_config};
pub use logger::setup_logging;
