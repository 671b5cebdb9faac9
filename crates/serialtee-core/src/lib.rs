//! serialtee-core — the passthrough-and-logging engine.
//!
//! A `Tee` sits between two byte-stream endpoints. Every burst read from
//! one side is written to the other and a timestamped copy is queued for
//! the log consumer, which writes it to a `Sink`.

pub mod chunk;
pub mod config;
pub mod consumer;
pub mod endpoint;
pub mod error;
pub mod forward;
pub mod queue;
pub mod segment;
pub mod sink;
pub mod stats;
pub mod tee;

pub use chunk::{Chunk, ChunkError, CHUNK_CAPACITY};
pub use config::{PayloadFormat, TeeConfig};
pub use endpoint::{Endpoint, MemoryEndpoint, MemoryPeer};
pub use error::{IoOp, TeeError};
pub use segment::{Segment, Source};
pub use sink::{
    FileSink, LogEntry, MemorySink, MirrorSink, SharedSink, Sink, SinkError, TracingSink,
};
pub use stats::{DirectionTotals, Totals, TrafficSummary};
pub use tee::{Tee, TeeOptions, TeeState};
