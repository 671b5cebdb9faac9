//! Operator notes — lines typed on the console, written into the traffic
//! log between the captured bursts.

use std::io::BufRead;

use anyhow::Result;
use serialtee_core::Sink;

/// Copy each non-empty line from `input` into `sink` until end of input.
/// Returns the number of notes written.
pub fn relay_notes<R: BufRead, S: Sink>(input: R, mut sink: S) -> Result<usize> {
    let mut written = 0;
    for line in input.lines() {
        let line = line?;
        let note = line.trim_end_matches('\r');
        if note.is_empty() {
            continue;
        }
        sink.note(note)?;
        written += 1;
    }
    Ok(written)
}
