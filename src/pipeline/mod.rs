//! Pipeline components: queue pool, shutdown signal, producer, consumers.

pub mod consumer;
pub mod context;
pub mod orchestrator;
pub mod producer;

pub use consumer::run_worker;
pub use context::{
    DoneToken, PipelineChannels, QueuePool, ShutdownSignal, create_pipeline_channels,
};
pub use orchestrator::{run_load, run_load_with};
pub use producer::read_raw_file;
