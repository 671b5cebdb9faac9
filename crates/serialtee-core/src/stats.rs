//! Per-direction byte and segment counters.

use crate::segment::Source;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub bytes: u64,
    pub segments: u64,
}

/// Counters indexed by the endpoint the bytes came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionTotals {
    by_source: [Totals; 2],
}

impl DirectionTotals {
    pub fn record(&mut self, source: Source, bytes: usize) {
        let t = &mut self.by_source[source.index()];
        t.bytes += bytes as u64;
        t.segments += 1;
    }

    pub fn get(&self, source: Source) -> Totals {
        self.by_source[source.index()]
    }

    pub fn total_bytes(&self) -> u64 {
        self.by_source.iter().map(|t| t.bytes).sum()
    }
}

/// What a finished session moved and logged.
///
/// A session halted by a failed write to the receiver has that last burst
/// in `logged` but not in `forwarded`, since bursts are logged first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficSummary {
    pub forwarded: DirectionTotals,
    pub logged: DirectionTotals,
    /// Entries the sink refused. Relay is unaffected by these.
    pub sink_failures: u64,
}

impl TrafficSummary {
    /// Every forwarded burst reached the sink.
    pub fn is_complete(&self) -> bool {
        self.sink_failures == 0 && self.forwarded == self.logged
    }
}
