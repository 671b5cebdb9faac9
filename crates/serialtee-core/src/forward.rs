//! Forwarding loop — relays bytes between the two endpoints, round-robin.
//!
//! Each iteration services A→B and then B→A. A direction with nothing to
//! read sleeps for the idle interval instead of spinning. Every burst is
//! enqueued for logging before it is written to the receiver.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::chunk::{Chunk, CHUNK_CAPACITY};
use crate::endpoint::Endpoint;
use crate::error::{IoOp, TeeError};
use crate::queue::SegmentSender;
use crate::segment::{Segment, Source};
use crate::stats::DirectionTotals;

pub struct Forwarder {
    a: Box<dyn Endpoint>,
    b: Box<dyn Endpoint>,
    queue: SegmentSender,
    shutdown: broadcast::Receiver<()>,
    started_at: Instant,
    idle_interval: Duration,
    totals: DirectionTotals,
}

impl Forwarder {
    pub fn new(
        a: Box<dyn Endpoint>,
        b: Box<dyn Endpoint>,
        queue: SegmentSender,
        shutdown: broadcast::Receiver<()>,
        started_at: Instant,
        idle_interval: Duration,
    ) -> Self {
        Self {
            a,
            b,
            queue,
            shutdown,
            started_at,
            idle_interval,
            totals: DirectionTotals::default(),
        }
    }

    /// Run until the stop signal is seen or an endpoint fails. The log
    /// queue is marked complete on the way out either way.
    pub fn run(mut self) -> (DirectionTotals, Result<(), TeeError>) {
        tracing::info!(
            idle_interval_ms = self.idle_interval.as_millis() as u64,
            "forwarder started"
        );

        let result = loop {
            if self.stop_requested() {
                break Ok(());
            }
            if let Err(e) = self.pump(Source::A) {
                break Err(e);
            }
            if let Err(e) = self.pump(Source::B) {
                break Err(e);
            }
        };

        let Forwarder { queue, totals, .. } = self;
        queue.complete();

        match &result {
            Ok(()) => tracing::info!(
                bytes_a = totals.get(Source::A).bytes,
                bytes_b = totals.get(Source::B).bytes,
                "forwarder stopped"
            ),
            Err(e) => tracing::error!(error = %e, "forwarder halted"),
        }
        (totals, result)
    }

    /// Polled once per iteration. A dropped controller counts as a stop.
    fn stop_requested(&mut self) -> bool {
        !matches!(self.shutdown.try_recv(), Err(TryRecvError::Empty))
    }

    /// Move at most one chunk from `source` to the opposite endpoint.
    /// Returns the number of bytes relayed.
    fn pump(&mut self, source: Source) -> Result<usize, TeeError> {
        let (sender, receiver) = match source {
            Source::A => (&mut self.a, &mut self.b),
            Source::B => (&mut self.b, &mut self.a),
        };

        let available = sender
            .bytes_to_read()
            .map_err(|e| TeeError::endpoint(source, IoOp::Poll, e))?;
        let readable = available.min(CHUNK_CAPACITY);
        if readable == 0 {
            thread::sleep(self.idle_interval);
            return Ok(0);
        }

        let mut buf = [0u8; CHUNK_CAPACITY];
        sender
            .read_exact(&mut buf[..readable])
            .map_err(|e| TeeError::endpoint(source, IoOp::Read, e))?;

        let mut chunk = Chunk::new();
        for &b in &buf[..readable] {
            chunk.push(b)?;
        }

        let segment = Segment::new(chunk, source, self.started_at.elapsed());
        self.queue.push(segment)?;

        let target = source.opposite();
        receiver
            .write_all(chunk.as_slice())
            .and_then(|()| receiver.flush())
            .map_err(|e| TeeError::endpoint(target, IoOp::Write, e))?;

        self.totals.record(source, readable);
        Ok(readable)
    }
}
