//! Pipeline channels: the queue pool and the shutdown signal.
//!
//! Both are built once per run in [`create_pipeline_channels`] and handed to
//! the producer and workers explicitly; nothing here is process-global.

use crossbeam_channel::{Receiver, Sender, bounded};
use rand::Rng;

use crate::types::RawRow;

/// Opaque termination token. The producer queues one per worker when the
/// input is exhausted; a worker holding one while its queue is empty retires.
#[derive(Clone, Copy, Debug)]
pub struct DoneToken;

/// Producer-side handle to the fixed pool of bounded row queues.
pub struct QueuePool {
    senders: Vec<Sender<RawRow>>,
}

impl QueuePool {
    /// Push a raw row onto a uniformly random queue, blocking while that
    /// queue is full (backpressure). Random routing accepts some load skew in
    /// exchange for a stateless producer.
    ///
    /// Returns the queue index the row landed on, or `None` when that queue's
    /// worker has already exited and dropped its receiver (the row is lost).
    pub fn push(&self, row: RawRow) -> Option<usize> {
        let index = rand::thread_rng().gen_range(0..self.senders.len());
        match self.senders[index].send(row) {
            Ok(()) => Some(index),
            Err(_) => None,
        }
    }

    /// Number of queues in the pool.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Bounded multi-producer/multi-consumer token channel for cooperative
/// termination. Capacity equals the worker count and at most that many tokens
/// are ever in circulation, so [`ShutdownSignal::requeue`] never blocks.
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: Sender<DoneToken>,
    rx: Receiver<DoneToken>,
}

impl ShutdownSignal {
    pub fn new(worker_count: usize) -> Self {
        let (tx, rx) = bounded(worker_count);
        Self { tx, rx }
    }

    /// Producer: announce end of input by queueing one token per worker.
    pub fn announce_done(&self, worker_count: usize) {
        for _ in 0..worker_count {
            let _ = self.tx.send(DoneToken);
        }
    }

    /// Worker: take a token if one is available right now. Never blocks.
    pub fn try_claim(&self) -> Option<DoneToken> {
        self.rx.try_recv().ok()
    }

    /// Worker: return a claimed token for a future draw, by this worker or
    /// another. The channel holds at most `worker_count - 1` other tokens
    /// while one is in hand, so the send cannot block.
    pub fn requeue(&self, token: DoneToken) {
        let _ = self.tx.send(token);
    }
}

/// Channels for one load: producer side of the pool, per-worker queue
/// receivers, and the shared shutdown signal.
pub struct PipelineChannels {
    pub pool: QueuePool,
    pub queues: Vec<Receiver<RawRow>>,
    pub signal: ShutdownSignal,
}

/// Build the queue pool and shutdown signal for `pipeline_count` workers,
/// each queue bounded at `queue_capacity` rows.
pub fn create_pipeline_channels(pipeline_count: usize, queue_capacity: usize) -> PipelineChannels {
    let mut senders = Vec::with_capacity(pipeline_count);
    let mut queues = Vec::with_capacity(pipeline_count);
    for _ in 0..pipeline_count {
        let (tx, rx) = bounded::<RawRow>(queue_capacity);
        senders.push(tx);
        queues.push(rx);
    }

    PipelineChannels {
        pool: QueuePool { senders },
        queues,
        signal: ShutdownSignal::new(pipeline_count),
    }
}
