//! Row formatting: raw delimited fields to a validated record.

use chrono::DateTime;
use log::warn;
use thiserror::Error;

use crate::types::PlayRecord;

/// Fields per raw row, in file column order: song_raw, song_clean, artist_raw,
/// artist_clean, call_sign, unix timestamp, unique_id, combined, is_first.
pub const RECORD_FIELD_COUNT: usize = 9;

/// Why a raw row was rejected. Rejected rows are dropped by the caller and
/// counted; nothing here is retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("row has {0} fields, expected {RECORD_FIELD_COUNT}")]
    Shape(usize),
    #[error("invalid timestamp: {0:?}")]
    Timestamp(String),
    #[error("invalid is_first flag: {0:?}")]
    Flag(String),
    #[error("empty unique_id")]
    MissingUniqueId,
}

/// Parse a truthy/falsy flag the way the airplay exports write them.
fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "True" | "TRUE" => Some(true),
        "0" | "f" | "F" | "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Convert one raw row into a [`PlayRecord`].
///
/// Rows with the wrong field count, an unparsable timestamp or flag, or an
/// empty `unique_id` are rejected. Any other empty field is suspect but
/// tolerated: the record is still returned, with a warning logged.
pub fn format_record(row: &[String]) -> Result<PlayRecord, FormatError> {
    if row.len() != RECORD_FIELD_COUNT {
        return Err(FormatError::Shape(row.len()));
    }

    let seconds: i64 = row[5]
        .parse()
        .map_err(|_| FormatError::Timestamp(row[5].clone()))?;
    let played_at = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| FormatError::Timestamp(row[5].clone()))?;
    let is_first = parse_flag(&row[8]).ok_or_else(|| FormatError::Flag(row[8].clone()))?;

    let has_empty_field = [&row[0], &row[1], &row[2], &row[3], &row[4], &row[7]]
        .iter()
        .any(|field| field.is_empty());
    if has_empty_field {
        warn!("record with empty fields: {row:?}");
    }
    if row[6].is_empty() {
        return Err(FormatError::MissingUniqueId);
    }

    Ok(PlayRecord {
        song_raw: row[0].clone(),
        song_clean: row[1].clone(),
        artist_raw: row[2].clone(),
        artist_clean: row[3].clone(),
        call_sign: row[4].clone(),
        played_at,
        unique_id: row[6].clone(),
        combined: row[7].clone(),
        is_first,
    })
}
