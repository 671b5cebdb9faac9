//! Log queue — unbounded FIFO of segments between the forwarder and the
//! log consumer.
//!
//! Completion is signalled by dropping (or calling `complete` on) the
//! sending half. The receiver then yields every segment still queued
//! before reporting the end of the stream.

use tokio::sync::mpsc;

use crate::segment::Segment;

/// Create a connected sender/receiver pair.
pub fn log_queue() -> (SegmentSender, SegmentReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SegmentSender { tx }, SegmentReceiver { rx })
}

/// Producer half, owned by the forwarding loop.
#[derive(Debug)]
pub struct SegmentSender {
    tx: mpsc::UnboundedSender<Segment>,
}

/// The consumer half is gone; nothing will read further segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("log queue consumer has gone away")]
pub struct QueueClosed;

impl SegmentSender {
    /// Enqueue without blocking.
    pub fn push(&self, segment: Segment) -> Result<(), QueueClosed> {
        self.tx.send(segment).map_err(|_| QueueClosed)
    }

    /// Mark the queue complete. No further segments can be added.
    pub fn complete(self) {
        drop(self);
    }
}

/// Consumer half, owned by the log consumer.
#[derive(Debug)]
pub struct SegmentReceiver {
    rx: mpsc::UnboundedReceiver<Segment>,
}

impl SegmentReceiver {
    /// Block the calling thread until a segment arrives. `None` once the
    /// queue is complete and drained.
    ///
    /// Must not be called from inside an async context.
    pub fn blocking_next(&mut self) -> Option<Segment> {
        self.rx.blocking_recv()
    }

    /// Non-blocking poll. `None` when nothing is queued right now or the
    /// queue is complete.
    pub fn try_next(&mut self) -> Option<Segment> {
        self.rx.try_recv().ok()
    }
}
