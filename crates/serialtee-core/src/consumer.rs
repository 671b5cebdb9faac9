//! Log consumer — drains the log queue into the sink.
//!
//! Runs on its own thread so a slow sink never holds up the relay. It
//! exits once the queue is complete and empty; that end-of-stream is the
//! normal shutdown path, not an error.

use crate::config::PayloadFormat;
use crate::queue::SegmentReceiver;
use crate::sink::{LogEntry, Sink};
use crate::stats::DirectionTotals;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub logged: DirectionTotals,
    pub sink_failures: u64,
}

pub struct LogConsumer {
    queue: SegmentReceiver,
    sink: Box<dyn Sink>,
    format: PayloadFormat,
}

impl LogConsumer {
    pub fn new(queue: SegmentReceiver, sink: Box<dyn Sink>, format: PayloadFormat) -> Self {
        Self {
            queue,
            sink,
            format,
        }
    }

    pub fn run(mut self) -> ConsumerReport {
        let mut report = ConsumerReport::default();

        while let Some(segment) = self.queue.blocking_next() {
            let entry = LogEntry::from_segment(&segment, self.format);
            match self.sink.record(&entry) {
                Ok(()) => report.logged.record(segment.source, segment.chunk.len()),
                Err(e) => {
                    report.sink_failures += 1;
                    // First failure, then every 1000th.
                    if report.sink_failures % 1000 == 1 {
                        tracing::warn!(
                            error = %e,
                            failures = report.sink_failures,
                            "failed to record traffic entry"
                        );
                    }
                }
            }
        }

        if let Err(e) = self.sink.flush() {
            tracing::warn!(error = %e, "failed to flush sink");
        }

        tracing::info!(
            bytes = report.logged.total_bytes(),
            sink_failures = report.sink_failures,
            "log consumer finished"
        );
        report
    }
}
