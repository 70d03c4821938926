//! Producer: stream the input file into the queue pool.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use log::{debug, error, info};

use crate::pipeline::context::{QueuePool, ShutdownSignal};
use crate::types::ProducerSummary;

/// Read `file` as delimited text and fan its rows out to the pool.
///
/// The first line is a header and is discarded without validation. Lines that
/// fail to decode at the reader layer are logged and skipped; they never
/// reach a queue. Field-count validation is left to the consumer-side
/// formatter, so the reader is configured flexible.
///
/// On exit — end of file or otherwise — one termination token per worker is
/// queued so every worker can retire once its own queue drains. No rows are
/// produced after the tokens go out.
pub fn read_raw_file(
    file: File,
    source: &Path,
    pool: &QueuePool,
    signal: &ShutdownSignal,
) -> ProducerSummary {
    let begin = Instant::now();
    let mut summary = ProducerSummary::default();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    for (n, result) in reader.records().enumerate() {
        // records() starts after the header, so data begins at line 2.
        let line = n + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                error!("{}: line {line}: {err}", source.display());
                summary.read_errors += 1;
                continue;
            }
        };
        summary.rows_read += 1;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        match pool.push(row) {
            Some(index) => debug!("pushed line {line} to queue {index}"),
            None => summary.rows_dropped += 1,
        }
    }

    summary.read_elapsed = begin.elapsed();
    info!(
        "read file over: {} rows from {} ({} read errors)",
        summary.rows_read,
        source.display(),
        summary.read_errors
    );
    info!("read file cost: {}ms", summary.read_elapsed.as_millis());

    signal.announce_done(pool.len());
    summary
}
