use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const CONFIG: &'static str = "spinload.toml";
}

/// Parallel bulk loader for delimited radio-airplay records.
#[derive(Clone, Parser)]
#[command(name = "spinload")]
#[command(about = "Load a delimited record file into the configured database table.")]
pub struct Cli {
    /// Delimited input file. The first line is treated as a header.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Configuration file.
    #[arg(long, short, default_value = DefaultArgs::CONFIG)]
    pub config: PathBuf,

    /// Delete all rows from the destination table before loading.
    #[arg(long)]
    pub clean: bool,
}
