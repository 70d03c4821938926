//! Spinload: parallel bulk loader for delimited radio-airplay records.
//!
//! A single producer streams the input file and fans rows out to a fixed pool
//! of bounded queues; one consumer worker per queue batch-formats the rows and
//! writes them to a SQLite table over its own connection. Termination is
//! cooperative: the producer queues one token per worker at end of input, and
//! each worker retires once it holds a token while its queue is empty.

pub mod engine;
pub mod format;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

/// Result alias used by the public spinload API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
