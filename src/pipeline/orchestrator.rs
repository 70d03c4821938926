//! Top-level load run: spawn the producer and worker pool, join both, report.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use log::{info, warn};

use crate::Result;
use crate::engine::db_ops::{Sink, SinkConn};
use crate::pipeline::consumer::run_worker;
use crate::pipeline::context::{PipelineChannels, create_pipeline_channels};
use crate::pipeline::producer::read_raw_file;
use crate::types::LoadReport;
use crate::utils::config::Config;

/// Load `source` into the configured database table.
///
/// Fatal when the pipeline sizes are invalid or the input file cannot be
/// opened; row-, batch-, and worker-level failures are logged and the run
/// continues. The run is finished only when the producer has exited and every
/// worker has retired or abandoned its queue.
pub fn run_load(source: &Path, config: &Config) -> Result<LoadReport> {
    let database = config.database.clone();
    run_load_with(source, config, move |_worker_id| SinkConn::connect(&database))
}

/// Generic run: `make_sink` builds each worker's private sink connection.
/// Split out from [`run_load`] so tests can drive the pipeline against a mock
/// sink or a failing connection factory.
pub fn run_load_with<S, F>(source: &Path, config: &Config, make_sink: F) -> Result<LoadReport>
where
    S: Sink + 'static,
    F: Fn(usize) -> Result<S> + Send + Sync + 'static,
{
    config.validate()?;
    let begin = Instant::now();

    // No recovery path for an unreadable input: fail before any thread starts.
    let file =
        File::open(source).with_context(|| format!("open input file {}", source.display()))?;

    info!(
        "pipeline count: {}, each queue capacity: {}",
        config.pipeline_count, config.queue_capacity
    );
    let PipelineChannels {
        pool,
        queues,
        signal,
    } = create_pipeline_channels(config.pipeline_count, config.queue_capacity);

    let make_sink = Arc::new(make_sink);
    let worker_handles: Vec<_> = queues
        .into_iter()
        .enumerate()
        .map(|(worker_id, queue)| {
            let signal = signal.clone();
            let make_sink = Arc::clone(&make_sink);
            thread::spawn(move || {
                run_worker(worker_id, queue, signal, move || (*make_sink)(worker_id))
            })
        })
        .collect();

    let source_owned = source.to_path_buf();
    let producer_handle = thread::spawn(move || read_raw_file(file, &source_owned, &pool, &signal));

    let producer = producer_handle
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;

    let mut workers = Vec::with_capacity(worker_handles.len());
    for handle in worker_handles {
        workers.push(
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("worker thread panicked"))?,
        );
    }

    let report = LoadReport {
        producer,
        workers,
        elapsed: begin.elapsed(),
    };
    log_report(&report);
    Ok(report)
}

fn log_report(report: &LoadReport) {
    for worker in &report.workers {
        if worker.abandoned {
            warn!(
                "worker {}: abandoned its queue after failed sink connection",
                worker.worker_id
            );
            continue;
        }
        info!(
            "worker {}: inserted {} rows in {} batches ({} rejected, {} fallbacks)",
            worker.worker_id,
            worker.rows_inserted,
            worker.batches,
            worker.rows_rejected,
            worker.fallbacks
        );
    }
    info!(
        "load done: {} rows read, {} inserted, {} rejected, {} dropped, {} read errors",
        report.producer.rows_read,
        report.rows_inserted(),
        report.rows_rejected(),
        report.producer.rows_dropped,
        report.producer.read_errors
    );
    info!("all cost: {}ms", report.elapsed.as_millis());
}
