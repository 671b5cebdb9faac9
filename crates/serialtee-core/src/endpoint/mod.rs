//! Endpoints — the two byte streams the tee sits between.
//!
//! The core never opens, configures, or closes an endpoint. Callers hand
//! over something that can report how many bytes are waiting, read them,
//! and write a span back out.

pub mod memory;

use std::io;

pub use memory::{MemoryEndpoint, MemoryPeer};

/// A duplex byte stream with a readable-byte query.
pub trait Endpoint: io::Read + io::Write + Send {
    /// Bytes that can be read right now without blocking.
    fn bytes_to_read(&mut self) -> io::Result<usize>;
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        (**self).bytes_to_read()
    }
}
