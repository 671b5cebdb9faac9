//! Lifecycle controller for one tee session.
//!
//! `Created → Running → Stopping → Stopped`, linear. `start` launches the
//! log consumer and the forwarder on their own threads; `stop` signals the
//! forwarder, which completes the log queue on its way out, and then joins
//! both. Dropping a running `Tee` does the same synchronously.

use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, oneshot};

use crate::config::PayloadFormat;
use crate::consumer::{ConsumerReport, LogConsumer};
use crate::endpoint::Endpoint;
use crate::error::TeeError;
use crate::forward::Forwarder;
use crate::queue::log_queue;
use crate::segment::Source;
use crate::sink::Sink;
use crate::stats::{DirectionTotals, TrafficSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeeState {
    Created,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeeOptions {
    /// Sleep when the polled endpoint has nothing to read.
    pub idle_interval: Duration,
    pub payload: PayloadFormat,
}

impl Default for TeeOptions {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_millis(10),
            payload: PayloadFormat::Hex,
        }
    }
}

/// Everything `start` hands off to the worker threads.
struct Parts {
    sink: Box<dyn Sink>,
    a: Box<dyn Endpoint>,
    b: Box<dyn Endpoint>,
}

type ForwardOutcome = (DirectionTotals, Result<(), TeeError>);
type StopOutcome = (TrafficSummary, Result<(), TeeError>);

struct Workers {
    shutdown: broadcast::Sender<()>,
    forwarder: thread::JoinHandle<ForwardOutcome>,
    consumer: thread::JoinHandle<ConsumerReport>,
}

impl Workers {
    /// Signal the forwarder and wait for both threads.
    fn stop_and_join(self) -> StopOutcome {
        // Err only if the forwarder already dropped its receiver.
        let _ = self.shutdown.send(());

        let mut summary = TrafficSummary::default();
        let mut result = match self.forwarder.join() {
            Ok((forwarded, result)) => {
                summary.forwarded = forwarded;
                result
            }
            Err(_) => Err(TeeError::Panicked { task: "forwarder" }),
        };

        match self.consumer.join() {
            Ok(report) => {
                summary.logged = report.logged;
                summary.sink_failures = report.sink_failures;
            }
            Err(_) => {
                if result.is_ok() {
                    result = Err(TeeError::Panicked {
                        task: "log consumer",
                    });
                }
            }
        }
        (summary, result)
    }
}

pub struct Tee {
    state: TeeState,
    options: TeeOptions,
    parts: Option<Parts>,
    workers: Option<Workers>,
    /// The join in flight while `Stopping`. Kept here so a dropped `stop`
    /// future can be resumed by the next call.
    stopping: Option<tokio::task::JoinHandle<StopOutcome>>,
    halted: Option<oneshot::Receiver<()>>,
    started_at: Option<Instant>,
    summary: TrafficSummary,
}

impl Tee {
    pub fn new<S, A, B>(sink: S, a: A, b: B, options: TeeOptions) -> Self
    where
        S: Sink + 'static,
        A: Endpoint + 'static,
        B: Endpoint + 'static,
    {
        Self {
            state: TeeState::Created,
            options,
            parts: Some(Parts {
                sink: Box::new(sink),
                a: Box::new(a),
                b: Box::new(b),
            }),
            workers: None,
            stopping: None,
            halted: None,
            started_at: None,
            summary: TrafficSummary::default(),
        }
    }

    pub fn state(&self) -> TeeState {
        self.state
    }

    /// When `start` was called. Segment timestamps are relative to this.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Launch the log consumer and the forwarder. Only valid once, from
    /// `Created`.
    pub fn start(&mut self) -> Result<(), TeeError> {
        let parts = match (self.state, self.parts.take()) {
            (TeeState::Created, Some(parts)) => parts,
            (state, parts) => {
                self.parts = parts;
                return Err(TeeError::InvalidState {
                    action: "start",
                    state,
                });
            }
        };

        let started_at = Instant::now();
        let (queue_tx, queue_rx) = log_queue();
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let (halted_tx, halted_rx) = oneshot::channel();

        let consumer = LogConsumer::new(queue_rx, parts.sink, self.options.payload);
        let consumer = thread::Builder::new()
            .name("tee-log".to_string())
            .spawn(move || consumer.run())
            .map_err(|error| {
                self.state = TeeState::Stopped;
                TeeError::Spawn {
                    task: "log consumer",
                    error,
                }
            })?;

        let forwarder = Forwarder::new(
            parts.a,
            parts.b,
            queue_tx,
            shutdown_rx,
            started_at,
            self.options.idle_interval,
        );
        let forwarder = thread::Builder::new()
            .name("tee-forward".to_string())
            .spawn(move || {
                let outcome = forwarder.run();
                let _ = halted_tx.send(());
                outcome
            });
        let forwarder = match forwarder {
            Ok(handle) => handle,
            Err(error) => {
                // The closure, and the queue sender inside it, is gone, so
                // the consumer drains and exits.
                let _ = consumer.join();
                self.state = TeeState::Stopped;
                return Err(TeeError::Spawn {
                    task: "forwarder",
                    error,
                });
            }
        };

        tracing::info!(
            idle_interval_ms = self.options.idle_interval.as_millis() as u64,
            payload = ?self.options.payload,
            "tee session started"
        );

        self.started_at = Some(started_at);
        self.halted = Some(halted_rx);
        self.workers = Some(Workers {
            shutdown,
            forwarder,
            consumer,
        });
        self.state = TeeState::Running;
        Ok(())
    }

    /// Resolves once the forwarder has exited, whether from `stop` or an
    /// endpoint failure. Returns immediately if nothing is running.
    /// Cancel-safe.
    pub async fn halted(&mut self) {
        if let Some(rx) = self.halted.as_mut() {
            // Err means the forwarder thread dropped the sender while
            // unwinding, which is a halt as well.
            let _ = rx.await;
            self.halted = None;
        }
    }

    /// Stop the session and wait for both workers. Returns the traffic
    /// summary, or the error that ended the forwarder. Calling it again
    /// after `Stopped` returns the same summary.
    ///
    /// Cancel-safe: if the returned future is dropped while `Stopping`, the
    /// workers keep shutting down and the next call picks up the result.
    pub async fn stop(&mut self) -> Result<TrafficSummary, TeeError> {
        match self.state {
            TeeState::Running => {
                let Some(workers) = self.workers.take() else {
                    self.state = TeeState::Stopped;
                    return Ok(self.summary);
                };
                self.halted = None;
                self.stopping = Some(tokio::task::spawn_blocking(move || {
                    workers.stop_and_join()
                }));
                self.state = TeeState::Stopping;
            }
            TeeState::Stopping => {}
            TeeState::Stopped => return Ok(self.summary),
            TeeState::Created => {
                self.parts = None;
                self.state = TeeState::Stopped;
                return Ok(self.summary);
            }
        }

        let joined = match self.stopping.as_mut() {
            Some(handle) => handle.await,
            None => {
                self.state = TeeState::Stopped;
                return Ok(self.summary);
            }
        };
        self.stopping = None;

        match joined {
            Ok((summary, result)) => {
                self.finish(summary);
                result.map(|()| summary)
            }
            Err(_) => {
                self.state = TeeState::Stopped;
                Err(TeeError::Panicked { task: "join" })
            }
        }
    }

    fn finish(&mut self, summary: TrafficSummary) {
        self.summary = summary;
        self.state = TeeState::Stopped;
        tracing::info!(
            forwarded_a = summary.forwarded.get(Source::A).bytes,
            forwarded_b = summary.forwarded.get(Source::B).bytes,
            logged_bytes = summary.logged.total_bytes(),
            sink_failures = summary.sink_failures,
            "tee session stopped"
        );
    }
}

impl Drop for Tee {
    fn drop(&mut self) {
        if let Some(workers) = self.workers.take() {
            tracing::debug!("tee dropped while running, stopping");
            let (summary, result) = workers.stop_and_join();
            if let Err(e) = result {
                tracing::error!(error = %e, "tee session ended with error");
            }
            self.finish(summary);
        }
    }
}
