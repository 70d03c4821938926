//! Command handler: wire config, logging, and the load run together.

use anyhow::Context;

use crate::Result;
use crate::engine::arg_parser::Cli;
use crate::engine::db_ops::{clean_table, open_db};
use crate::pipeline::run_load;
use crate::utils::config::load_config;
use crate::utils::setup_logging;

/// Run one load from the parsed command line.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    setup_logging(config.debug);
    config.validate()?;

    if cli.clean {
        let conn = open_db(&config.database.path, &config.database.table)
            .context("open database for clean")?;
        clean_table(&conn, &config.database.table)?;
    }

    run_load(&cli.file, &config)?;
    Ok(())
}
