//! Error types for a tee session.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::chunk::ChunkError;
use crate::queue::QueueClosed;
use crate::segment::Source;
use crate::tee::TeeState;

/// Which endpoint operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Poll,
    Read,
    Write,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoOp::Poll => "poll",
            IoOp::Read => "read",
            IoOp::Write => "write",
        })
    }
}

#[derive(Debug, Error)]
pub enum TeeError {
    #[error("endpoint {endpoint} {op} failed: {error}")]
    Endpoint {
        endpoint: Source,
        op: IoOp,
        #[source]
        error: io::Error,
    },

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    LogQueue(#[from] QueueClosed),

    #[error("cannot {action} a tee in state {state:?}")]
    InvalidState {
        action: &'static str,
        state: TeeState,
    },

    #[error("failed to spawn {task} thread: {error}")]
    Spawn {
        task: &'static str,
        #[source]
        error: io::Error,
    },

    #[error("{task} thread panicked")]
    Panicked { task: &'static str },
}

impl TeeError {
    pub(crate) fn endpoint(endpoint: Source, op: IoOp, error: io::Error) -> Self {
        TeeError::Endpoint {
            endpoint,
            op,
            error,
        }
    }

    /// True for failures of the serial link itself rather than of the tee.
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(self, TeeError::Endpoint { .. })
    }
}
