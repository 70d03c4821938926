//! Open per-worker connections and table maintenance.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use log::info;
use rusqlite::Connection;

use super::schema_sql;
use crate::Result;

/// Pragmas for several single-writer connections on one database file: WAL
/// keeps writers from blocking readers, busy_timeout serializes concurrent
/// writers instead of erroring.
const WAL_PRAGMAS: &str = "
    PRAGMA synchronous = NORMAL;
    PRAGMA wal_autocheckpoint = 10000;
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the sink database and ensure the destination table exists (idempotent).
/// The busy timeout is set first so concurrent worker connects retry instead
/// of failing while another connection holds the write lock.
pub fn open_db(path: &Path, table: &str) -> Result<Connection> {
    let conn = Connection::open(path).context("open database")?;
    conn.busy_timeout(BUSY_TIMEOUT).context("set busy timeout")?;
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .context("enable WAL")?;
    conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
    conn.execute_batch(&schema_sql(table)).context("create schema")?;
    Ok(conn)
}

/// Delete every row from the destination table (the `--clean` flag).
/// Returns the number of rows removed.
pub fn clean_table(conn: &Connection, table: &str) -> Result<usize> {
    let deleted = conn
        .execute(&format!("DELETE FROM {table}"), [])
        .context("clean table")?;
    info!("clean table {table}: deleted {deleted} rows");
    Ok(deleted)
}
