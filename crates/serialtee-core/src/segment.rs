//! Segment — one logged burst: chunk, source endpoint, session-relative time.

use std::fmt;
use std::time::Duration;

use crate::chunk::Chunk;

/// Which endpoint a burst was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Host side, e.g. a virtual serial port.
    A,
    /// Bus side, e.g. the physical port.
    B,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::A, Source::B];

    /// The endpoint bytes from this source are relayed to.
    pub fn opposite(self) -> Source {
        match self {
            Source::A => Source::B,
            Source::B => Source::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Source::A => 0,
            Source::B => 1,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::A => f.write_str("A"),
            Source::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub chunk: Chunk,
    pub source: Source,
    /// Elapsed time since the session started.
    pub timestamp: Duration,
}

impl Segment {
    pub fn new(chunk: Chunk, source: Source, timestamp: Duration) -> Self {
        Self {
            chunk,
            source,
            timestamp,
        }
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }
}
