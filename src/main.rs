//! Spinload CLI: load a delimited airplay record file into the configured table.

use anyhow::Result;
use clap::Parser;
use spinload::engine::arg_parser::Cli;
use spinload::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
