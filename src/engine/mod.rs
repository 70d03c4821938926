//! Engine module: CLI surface and database operations.

pub mod arg_parser;
pub mod db_ops;
pub mod handlers;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use db_ops::{Sink, SinkConn, clean_table, open_db};
pub use handlers::handle_run;
