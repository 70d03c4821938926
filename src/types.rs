//! Public and internal types for the spinload API and pipeline.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// One raw row as read from the input file: ordered string fields, unvalidated.
pub type RawRow = Vec<String>;

/// A validated airplay record, ready for insertion.
///
/// Field order matches the input file columns; `call_sign` is stored in the
/// `callsign` column of the destination table.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayRecord {
    pub song_raw: String,
    pub song_clean: String,
    pub artist_raw: String,
    pub artist_clean: String,
    pub call_sign: String,
    /// Play time, parsed from the unix timestamp column.
    pub played_at: DateTime<Utc>,
    /// Non-empty; rows without it are rejected before they reach the sink.
    pub unique_id: String,
    pub combined: String,
    pub is_first: bool,
}

/// What the producer saw while reading the input file.
#[derive(Clone, Debug, Default)]
pub struct ProducerSummary {
    /// Rows read after the header, whether or not they later validate.
    pub rows_read: usize,
    /// Lines that failed to decode at the reader layer (logged and skipped).
    pub read_errors: usize,
    /// Rows routed to a queue whose worker had already abandoned it.
    pub rows_dropped: usize,
    /// Wall-clock time spent reading the file.
    pub read_elapsed: Duration,
}

/// Per-worker accounting, returned from each worker thread on exit.
#[derive(Clone, Debug)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub rows_inserted: usize,
    /// Rows rejected by the formatter (bad shape, timestamp, flag, or id).
    pub rows_rejected: usize,
    /// Drain-and-flush batches handed to the sink.
    pub batches: usize,
    /// Multi-row insert chunks that succeeded.
    pub chunks_ok: usize,
    /// Batches that fell back to row-by-row insertion.
    pub fallbacks: usize,
    /// True when the worker exited without draining its queue (sink
    /// connection failed twice). Rows routed there are lost.
    pub abandoned: bool,
}

impl WorkerSummary {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            rows_inserted: 0,
            rows_rejected: 0,
            batches: 0,
            chunks_ok: 0,
            fallbacks: 0,
            abandoned: false,
        }
    }
}

/// Result of one `insert_batch` call.
#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    /// Rows the database reported inserted, including any re-inserted by the
    /// row-by-row fallback.
    pub rows_inserted: usize,
    /// Multi-row chunks that succeeded before any failure.
    pub chunks_ok: usize,
    /// True when a chunk failed and the whole record list was re-submitted
    /// row by row.
    pub fell_back: bool,
}

/// Aggregate report for one load run.
#[derive(Debug)]
pub struct LoadReport {
    pub producer: ProducerSummary,
    pub workers: Vec<WorkerSummary>,
    /// Wall-clock time for the whole run (read + drain + insert).
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn rows_inserted(&self) -> usize {
        self.workers.iter().map(|w| w.rows_inserted).sum()
    }

    pub fn rows_rejected(&self) -> usize {
        self.workers.iter().map(|w| w.rows_rejected).sum()
    }

    pub fn fallbacks(&self) -> usize {
        self.workers.iter().map(|w| w.fallbacks).sum()
    }

    pub fn workers_abandoned(&self) -> usize {
        self.workers.iter().filter(|w| w.abandoned).count()
    }
}
