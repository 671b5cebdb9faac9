//! In-memory endpoint for tests and dry runs.
//!
//! `MemoryEndpoint` is the side handed to the tee. `MemoryPeer` plays the
//! device on the far end: it injects bytes the tee will read and inspects
//! what the tee wrote.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use super::Endpoint;

#[derive(Default)]
struct Inner {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    /// One entry per `write` call, in order.
    bursts: Vec<Vec<u8>>,
    fail_reads: Option<io::ErrorKind>,
    fail_writes: Option<io::ErrorKind>,
    polls: u64,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Inner> {
    // A panicking test thread must not hide the data from the others.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MemoryEndpoint {
    shared: Shared,
}

#[derive(Clone)]
pub struct MemoryPeer {
    shared: Shared,
}

impl MemoryEndpoint {
    pub fn new() -> (MemoryEndpoint, MemoryPeer) {
        let shared = Shared::default();
        (
            MemoryEndpoint {
                shared: shared.clone(),
            },
            MemoryPeer { shared },
        )
    }
}

impl Endpoint for MemoryEndpoint {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let mut inner = lock(&self.shared);
        inner.polls += 1;
        if let Some(kind) = inner.fail_reads {
            return Err(io::Error::new(kind, "injected read failure"));
        }
        Ok(inner.inbound.len())
    }
}

impl io::Read for MemoryEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = lock(&self.shared);
        if let Some(kind) = inner.fail_reads {
            return Err(io::Error::new(kind, "injected read failure"));
        }
        let n = buf.len().min(inner.inbound.len());
        for (slot, b) in buf.iter_mut().zip(inner.inbound.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }
}

impl io::Write for MemoryEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = lock(&self.shared);
        if let Some(kind) = inner.fail_writes {
            return Err(io::Error::new(kind, "injected write failure"));
        }
        inner.written.extend_from_slice(buf);
        inner.bursts.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl MemoryPeer {
    /// Queue bytes as if the device had sent them.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.shared).inbound.extend(bytes.iter().copied());
    }

    /// Everything the tee has written to this endpoint so far.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.shared).written.clone()
    }

    /// Writes as the tee issued them, one `Vec` per call.
    pub fn write_bursts(&self) -> Vec<Vec<u8>> {
        lock(&self.shared).bursts.clone()
    }

    /// Injected bytes the tee has not read yet.
    pub fn pending(&self) -> usize {
        lock(&self.shared).inbound.len()
    }

    /// Number of `bytes_to_read` queries issued against this endpoint.
    pub fn polls(&self) -> u64 {
        lock(&self.shared).polls
    }

    /// Make every subsequent poll and read fail with `kind`.
    pub fn fail_reads(&self, kind: io::ErrorKind) {
        lock(&self.shared).fail_reads = Some(kind);
    }

    /// Make every subsequent write fail with `kind`.
    pub fn fail_writes(&self, kind: io::ErrorKind) {
        lock(&self.shared).fail_writes = Some(kind);
    }
}
