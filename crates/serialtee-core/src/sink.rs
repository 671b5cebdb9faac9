//! Log sinks — where formatted traffic entries end up.
//!
//! The consumer turns each segment into a `LogEntry` and hands it to a
//! `Sink`. Sinks own durability and storage; the core only formats.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::config::{LogConfig, PayloadFormat};
use crate::segment::{Segment, Source};

/// One structured traffic record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Seconds since session start.
    pub timestamp: f64,
    pub source: Source,
    pub payload: String,
}

impl LogEntry {
    pub fn from_segment(segment: &Segment, format: PayloadFormat) -> Self {
        Self {
            timestamp: segment.timestamp_secs(),
            source: segment.source,
            payload: format.render(&segment.chunk),
        }
    }

    /// Fixed-width line: `     0.012 PC 41 42 43 `.
    pub fn line(&self, label: &str) -> String {
        format!("{:>10.3} {} {}", self.timestamp, label, self.payload)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line(&self.source.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

pub trait Sink: Send {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError>;

    /// Free-text operator note written alongside the traffic.
    fn note(&mut self, text: &str) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        (**self).record(entry)
    }

    fn note(&mut self, text: &str) -> Result<(), SinkError> {
        (**self).note(text)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

// ── Shared ────────────────────────────────────────────────────────────────────

/// A sink shared between the log consumer and other writers such as the
/// operator-note reader. Clones write to the same underlying sink.
pub struct SharedSink<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Sink> SharedSink<S> {
    pub fn new(sink: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, SinkError> {
        self.inner
            .lock()
            .map_err(|_| SinkError::Unavailable("sink lock poisoned".to_string()))
    }
}

impl<S: Sink> Sink for SharedSink<S> {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        self.lock()?.record(entry)
    }

    fn note(&mut self, text: &str) -> Result<(), SinkError> {
        self.lock()?.note(text)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.lock()?.flush()
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Line-oriented sink over any writer.
pub struct WriterSink<W: Write + Send> {
    writer: W,
    labels: [String; 2],
    flush_each_entry: bool,
}

/// The traffic log file.
pub type FileSink = WriterSink<BufWriter<File>>;

impl FileSink {
    /// Open (append) the log file described by `config`. A relative path
    /// resolves against the working directory.
    pub fn open(config: &LogConfig) -> io::Result<Self> {
        Self::open_path(&config.path, config)
    }

    pub fn open_path(path: &Path, config: &LogConfig) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(WriterSink::new(BufWriter::new(file), config))
    }
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, config: &LogConfig) -> Self {
        Self {
            writer,
            labels: [config.label_a.clone(), config.label_b.clone()],
            flush_each_entry: config.flush_each_entry,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn finish_line(&mut self) -> Result<(), SinkError> {
        if self.flush_each_entry {
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        let line = entry.line(&self.labels[entry.source.index()]);
        writeln!(self.writer, "{}", line)?;
        self.finish_line()
    }

    fn note(&mut self, text: &str) -> Result<(), SinkError> {
        writeln!(self.writer, "User note: {}", text)?;
        self.finish_line()
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

// ── Tracing ───────────────────────────────────────────────────────────────────

/// Emits traffic as `tracing` events on the `serialtee::traffic` target.
pub struct TracingSink {
    labels: [String; 2],
}

impl TracingSink {
    pub fn new(config: &LogConfig) -> Self {
        Self {
            labels: [config.label_a.clone(), config.label_b.clone()],
        }
    }
}

impl Sink for TracingSink {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        let timestamp = format!("{:.3}", entry.timestamp);
        tracing::info!(
            target: "serialtee::traffic",
            timestamp = %timestamp,
            source = %self.labels[entry.source.index()],
            payload = %entry.payload,
            "traffic"
        );
        Ok(())
    }

    fn note(&mut self, text: &str) -> Result<(), SinkError> {
        tracing::info!(target: "serialtee::traffic", note = %text, "user note");
        Ok(())
    }
}

// ── Mirror ────────────────────────────────────────────────────────────────────

/// Writes to `primary` and copies every entry to `mirror`. Only the
/// primary's result is reported; mirror failures are logged and dropped.
pub struct MirrorSink<P, M> {
    primary: P,
    mirror: M,
}

impl<P: Sink, M: Sink> MirrorSink<P, M> {
    pub fn new(primary: P, mirror: M) -> Self {
        Self { primary, mirror }
    }
}

impl<P: Sink, M: Sink> Sink for MirrorSink<P, M> {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        if let Err(e) = self.mirror.record(entry) {
            tracing::debug!(error = %e, "mirror sink rejected entry");
        }
        self.primary.record(entry)
    }

    fn note(&mut self, text: &str) -> Result<(), SinkError> {
        if let Err(e) = self.mirror.note(text) {
            tracing::debug!(error = %e, "mirror sink rejected note");
        }
        self.primary.note(text)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if let Err(e) = self.mirror.flush() {
            tracing::debug!(error = %e, "mirror sink failed to flush");
        }
        self.primary.flush()
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    entries: Vec<LogEntry>,
    notes: Vec<String>,
    flushes: usize,
}

/// Records entries in memory. Clones share the same record.
#[derive(Clone, Default)]
pub struct MemorySink {
    recorded: Arc<Mutex<Recorded>>,
    reject: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that refuses every entry.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    pub fn notes(&self) -> Vec<String> {
        self.lock().notes.clone()
    }

    pub fn flushes(&self) -> usize {
        self.lock().flushes
    }
}

impl Sink for MemorySink {
    fn record(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        if self.reject {
            return Err(SinkError::Unavailable("memory sink rejects entries".to_string()));
        }
        self.lock().entries.push(entry.clone());
        Ok(())
    }

    fn note(&mut self, text: &str) -> Result<(), SinkError> {
        self.lock().notes.push(text.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.lock().flushes += 1;
        Ok(())
    }
}
