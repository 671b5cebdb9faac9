//! serialtee integration tests.
//!
//! Each test runs a real `Tee` session, worker threads included, between
//! two in-memory endpoints and inspects what each side received and what
//! the sink recorded.
//!
//!   cargo test --test integration

use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use serialtee_core::{
    LogEntry, MemoryEndpoint, MemoryPeer, MemorySink, Source, Tee, TeeOptions,
};

mod failures;
mod lifecycle;
mod passthrough;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const FAST_IDLE: Duration = Duration::from_millis(1);

pub struct Session {
    pub tee: Tee,
    pub a: MemoryPeer,
    pub b: MemoryPeer,
    pub sink: MemorySink,
}

/// Build a session around a fresh pair of memory endpoints. Not started.
pub fn session(idle_interval: Duration) -> Session {
    session_with_sink(MemorySink::new(), idle_interval)
}

pub fn session_with_sink(sink: MemorySink, idle_interval: Duration) -> Session {
    let (ep_a, a) = MemoryEndpoint::new();
    let (ep_b, b) = MemoryEndpoint::new();
    let options = TeeOptions {
        idle_interval,
        ..TeeOptions::default()
    };
    let tee = Tee::new(sink.clone(), ep_a, ep_b, options);
    Session { tee, a, b, sink }
}

/// Poll `cond` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !cond() {
        if Instant::now() > deadline {
            bail!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    Ok(())
}

/// Parse a hex payload (`41 42 43 `) back into bytes.
pub fn hex_bytes(payload: &str) -> Vec<u8> {
    payload
        .split_whitespace()
        .map(|h| u8::from_str_radix(h, 16).expect("hex payload"))
        .collect()
}

pub fn entries_from(entries: &[LogEntry], source: Source) -> Vec<LogEntry> {
    entries
        .iter()
        .filter(|e| e.source == source)
        .cloned()
        .collect()
}

/// Concatenated payload bytes logged for one direction.
pub fn logged_bytes(entries: &[LogEntry], source: Source) -> Vec<u8> {
    entries_from(entries, source)
        .iter()
        .flat_map(|e| hex_bytes(&e.payload))
        .collect()
}

#[test]
fn hex_bytes_parses_log_payloads() {
    assert_eq!(hex_bytes("41 42 43 "), b"ABC");
    assert!(hex_bytes("").is_empty());
}
