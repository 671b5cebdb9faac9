//! Chunk — the fixed-capacity staging buffer for one forwarded burst.
//!
//! A chunk never allocates. The forwarding loop fills a fresh one per
//! read, hands a copy to the log queue, and writes the same bytes to the
//! opposite endpoint.

use std::fmt;
use std::fmt::Write as _;
use std::ops::Index;

use thiserror::Error;

/// Maximum number of bytes a single chunk can hold.
pub const CHUNK_CAPACITY: usize = 16;

#[derive(Clone, Copy)]
pub struct Chunk {
    data: [u8; CHUNK_CAPACITY],
    len: usize,
}

impl Chunk {
    pub const fn new() -> Self {
        Self {
            data: [0u8; CHUNK_CAPACITY],
            len: 0,
        }
    }

    /// Build a chunk from a slice of at most `CHUNK_CAPACITY` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ChunkError> {
        let mut chunk = Self::new();
        for &b in bytes {
            chunk.push(b)?;
        }
        Ok(chunk)
    }

    /// Append one byte at `len`. A full chunk rejects the byte and is left
    /// untouched.
    pub fn push(&mut self, byte: u8) -> Result<(), ChunkError> {
        if self.is_full() {
            return Err(ChunkError::Full);
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Byte at `index`, or `None` beyond `len`.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// Overwrite the byte at `index`. Only `[0, len)` is writable.
    pub fn set(&mut self, index: usize, byte: u8) -> Result<(), ChunkError> {
        if index >= self.len {
            return Err(ChunkError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.data[index] = byte;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == CHUNK_CAPACITY
    }

    /// Uppercase hex, every byte followed by a single space: `41 42 43 `.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(self.len * 3);
        for b in self.as_slice() {
            let _ = write!(s, "{:02X} ", b);
        }
        s
    }

    /// Printable rendering: ASCII graphic characters and space as-is, CR and
    /// LF as `\r` / `\n`, anything else as `\xNN`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Chunk {}

impl Index<usize> for Chunk {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.as_slice()[index]
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.as_slice() {
            match b {
                b'\r' => f.write_str("\\r")?,
                b'\n' => f.write_str("\\n")?,
                0x20..=0x7e => f.write_char(char::from(b))?,
                _ => write!(f, "\\x{:02X}", b)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("len", &self.len)
            .field("data", &self.as_slice())
            .finish()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk is full ({} bytes)", CHUNK_CAPACITY)]
    Full,

    #[error("index {index} out of range for chunk of length {len}")]
    OutOfRange { index: usize, len: usize },
}
