//! Pipeline tests: routing, termination protocol, and end-to-end accounting
//! against a mock sink.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::anyhow;
use crossbeam_channel::bounded;
use spinload::engine::db_ops::Sink;
use spinload::pipeline::{ShutdownSignal, create_pipeline_channels, run_load_with, run_worker};
use spinload::types::{BatchOutcome, PlayRecord, RawRow};
use spinload::utils::config::{Config, DatabaseConfig};

/// Sink that records everything it receives; shared across workers.
#[derive(Clone, Default)]
struct MockSink {
    records: Arc<Mutex<Vec<PlayRecord>>>,
}

impl MockSink {
    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Sink for MockSink {
    fn insert_batch(&mut self, records: &[PlayRecord]) -> spinload::Result<BatchOutcome> {
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(BatchOutcome {
            rows_inserted: records.len(),
            chunks_ok: 1,
            fell_back: false,
        })
    }
}

fn test_config(pipeline_count: usize, queue_capacity: usize) -> Config {
    Config {
        pipeline_count,
        queue_capacity,
        debug: false,
        database: DatabaseConfig {
            path: PathBuf::from("unused.db"),
            table: "plays".to_string(),
            max_multi_insert: 5,
        },
    }
}

fn valid_line(id: usize) -> String {
    format!("Song {id},Song {id},Artist,Artist,KEXP,{},id-{id:04},Artist - Song {id},true", 1_700_000_000 + id)
}

fn write_input(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("input.csv");
    let mut content = String::from(
        "song_raw,song_clean,artist_raw,artist_clean,call_sign,unix_timestamp,unique_id,combined,is_first\n",
    );
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

fn valid_raw_row(id: usize) -> RawRow {
    valid_line(id).split(',').map(str::to_string).collect()
}

// --- routing ---

#[test]
fn test_random_routing_spreads_across_queues() {
    let total = 10_000;
    let channels = create_pipeline_channels(4, total);
    for id in 0..total {
        assert!(channels.pool.push(valid_raw_row(id)).is_some());
    }

    // Uniform routing: each queue should land near total/4. The band is wide
    // enough that a fair router essentially never fails it.
    let expected = total / 4;
    for (index, queue) in channels.queues.iter().enumerate() {
        let got = queue.len();
        assert!(
            got > expected / 2 && got < expected * 2,
            "queue {index} got {got} of {total} rows"
        );
    }
}

// --- termination protocol ---

/// Tokens arrive while one queue is still backlogged: its worker must requeue
/// the token, drain, and only then retire. Both workers must reach quiescence.
#[test]
fn test_worker_retires_only_after_queue_empties() {
    let backlog = 250;
    let (tx, backlogged_queue) = bounded::<RawRow>(backlog);
    let (_idle_tx, idle_queue) = bounded::<RawRow>(backlog);
    for id in 0..backlog {
        tx.send(valid_raw_row(id)).unwrap();
    }

    // End of input is announced before either worker starts, so the first
    // token draw happens against a non-empty queue.
    let signal = ShutdownSignal::new(2);
    signal.announce_done(2);

    let sink = MockSink::default();
    let handles: Vec<_> = [backlogged_queue, idle_queue]
        .into_iter()
        .enumerate()
        .map(|(worker_id, queue)| {
            let signal = signal.clone();
            let sink = sink.clone();
            thread::spawn(move || run_worker(worker_id, queue, signal, move || Ok(sink.clone())))
        })
        .collect();

    let summaries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(sink.len(), backlog);
    let total_inserted: usize = summaries.iter().map(|s| s.rows_inserted).sum();
    assert_eq!(total_inserted, backlog);
    assert!(summaries.iter().all(|s| !s.abandoned));
}

// --- end-to-end accounting with a mock sink ---

#[test]
fn test_rows_read_equals_rejected_plus_inserted() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines: Vec<String> = (0..8).map(valid_line).collect();
    lines.push("too,short,row".to_string());
    lines.push("s,s,a,a,KEXP,not-a-timestamp,id-bad-ts,c,true".to_string());
    lines.push("s,s,a,a,KEXP,1700000000,id-bad-flag,c,maybe".to_string());
    lines.push("s,s,a,a,KEXP,1700000000,,c,true".to_string());
    let input = write_input(dir.path(), &lines);

    let sink = MockSink::default();
    let factory_sink = sink.clone();
    let report = run_load_with(&input, &test_config(3, 10), move |_| {
        Ok(factory_sink.clone())
    })
    .unwrap();

    assert_eq!(report.producer.rows_read, 12);
    assert_eq!(report.rows_rejected(), 4);
    assert_eq!(report.rows_inserted(), 8);
    assert_eq!(sink.len(), 8);
    assert_eq!(report.producer.rows_dropped, 0);
    assert_eq!(
        report.producer.rows_read,
        report.rows_rejected() + report.rows_inserted()
    );
}

#[test]
fn test_abandoned_worker_loses_rows_but_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..200).map(valid_line).collect();
    let input = write_input(dir.path(), &lines);

    let sink = MockSink::default();
    let factory_sink = sink.clone();
    let report = run_load_with(&input, &test_config(2, 10), move |worker_id| {
        if worker_id == 0 {
            Err(anyhow!("connection refused"))
        } else {
            Ok(factory_sink.clone())
        }
    })
    .unwrap();

    assert_eq!(report.workers_abandoned(), 1);
    assert_eq!(report.producer.rows_read, 200);
    // Rows routed to the abandoned queue are lost; everything else must be
    // accounted for.
    assert_eq!(report.rows_inserted(), sink.len());
    assert!(report.rows_inserted() > 0);
    assert!(
        report.rows_inserted() + report.rows_rejected() + report.producer.rows_dropped
            <= report.producer.rows_read
    );
}

// --- fatal startup conditions ---

#[test]
fn test_zero_pipeline_count_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &[valid_line(0)]);
    let err = run_load_with(&input, &test_config(0, 10), |_| Ok(MockSink::default()))
        .unwrap_err();
    assert!(err.to_string().contains("pipeline_count"));
}

#[test]
fn test_zero_queue_capacity_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &[valid_line(0)]);
    let err = run_load_with(&input, &test_config(4, 0), |_| Ok(MockSink::default()))
        .unwrap_err();
    assert!(err.to_string().contains("queue_capacity"));
}

#[test]
fn test_missing_input_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.csv");
    let err = run_load_with(&missing, &test_config(2, 10), |_| Ok(MockSink::default()))
        .unwrap_err();
    assert!(err.to_string().contains("open input file"));
}
