//! Consumer worker: drain one queue, batch-format, write to the sink.

use std::thread;

use crossbeam_channel::Receiver;
use log::{debug, error, warn};

use crate::Result;
use crate::engine::db_ops::Sink;
use crate::format::format_record;
use crate::pipeline::context::ShutdownSignal;
use crate::types::{RawRow, WorkerSummary};

/// Run one worker against its queue until the producer is done and the queue
/// is empty.
///
/// `connect` builds this worker's private sink connection. It is attempted
/// twice at startup; a second failure abandons the queue, and rows already
/// routed there are lost.
///
/// Termination: a claimed token proves the producer has exited. If the queue
/// is empty at that moment, nothing more can arrive and the worker retires,
/// consuming the token. If not, the token is requeued for a future draw
/// (possibly by another worker) and one more drain pass runs before the next
/// check. Token count never exceeds the worker count, so the run reaches
/// quiescence; the cost is a busy poll while queue and signal are both
/// momentarily empty.
pub fn run_worker<S, F>(
    worker_id: usize,
    queue: Receiver<RawRow>,
    signal: ShutdownSignal,
    connect: F,
) -> WorkerSummary
where
    S: Sink,
    F: Fn() -> Result<S>,
{
    debug!("worker {worker_id}: starting");
    let mut summary = WorkerSummary::new(worker_id);

    let mut sink = match connect().or_else(|err| {
        warn!("worker {worker_id}: sink connection failed, retrying once: {err:#}");
        connect()
    }) {
        Ok(sink) => sink,
        Err(err) => {
            error!(
                "worker {worker_id}: sink connection failed after retry, abandoning queue: {err:#}"
            );
            summary.abandoned = true;
            return summary;
        }
    };

    loop {
        match signal.try_claim() {
            Some(token) => {
                if queue.is_empty() {
                    debug!("worker {worker_id}: queue drained, retiring");
                    break;
                }
                // Not this worker's turn yet: give the token back and clear
                // the backlog before checking again.
                signal.requeue(token);
                drain_and_flush(worker_id, &queue, &mut sink, &mut summary);
            }
            None => {
                if !drain_and_flush(worker_id, &queue, &mut sink, &mut summary) {
                    thread::yield_now();
                }
            }
        }
    }

    summary
}

/// Take a snapshot of everything currently buffered on the queue, format it,
/// and hand the valid records to the sink as one batch. Never blocks waiting
/// for more rows. Returns false when the queue was empty.
fn drain_and_flush<S: Sink>(
    worker_id: usize,
    queue: &Receiver<RawRow>,
    sink: &mut S,
    summary: &mut WorkerSummary,
) -> bool {
    let buffered = queue.len();
    if buffered == 0 {
        return false;
    }

    let mut rows = Vec::with_capacity(buffered);
    for _ in 0..buffered {
        match queue.try_recv() {
            Ok(row) => rows.push(row),
            Err(_) => break,
        }
    }
    debug!("worker {worker_id}: got {} rows to batch process", rows.len());

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        match format_record(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                error!("worker {worker_id}: rejected row: {err}: {row:?}");
                summary.rows_rejected += 1;
            }
        }
    }
    if records.is_empty() {
        return true;
    }

    summary.batches += 1;
    match sink.insert_batch(&records) {
        Ok(outcome) => {
            summary.rows_inserted += outcome.rows_inserted;
            summary.chunks_ok += outcome.chunks_ok;
            if outcome.fell_back {
                summary.fallbacks += 1;
            }
        }
        Err(err) => error!("worker {worker_id}: batch insert failed: {err:#}"),
    }
    true
}
