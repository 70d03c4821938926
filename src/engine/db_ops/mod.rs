//! Database operations: schema, per-worker connections, batch insert.

mod connection;
mod insert;

pub use connection::{clean_table, open_db};
pub use insert::{Sink, SinkConn};

/// Destination columns in insert order. The record's `call_sign` field lands
/// in the `callsign` column; `time` holds the play timestamp.
pub(crate) const INSERT_COLUMNS: &str =
    "song_raw, song_clean, artist_raw, artist_clean, callsign, time, unique_id, combined, is_first";

/// One parameter group per record.
pub(crate) const VALUES_TEMPLATE: &str = "(?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Destination schema. No uniqueness constraints: the loader does not
/// deduplicate, and the row-by-row fallback may legitimately re-insert rows.
pub(crate) fn schema_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            song_raw TEXT NOT NULL,
            song_clean TEXT NOT NULL,
            artist_raw TEXT NOT NULL,
            artist_clean TEXT NOT NULL,
            callsign TEXT NOT NULL,
            time TEXT NOT NULL,
            unique_id TEXT NOT NULL,
            combined TEXT NOT NULL,
            is_first INTEGER NOT NULL
        )"
    )
}
