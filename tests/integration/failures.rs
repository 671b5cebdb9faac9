use crate::*;

use std::io::ErrorKind;

use serialtee_core::{Sink, SinkError, TeeError};

/// Takes the log consumer down with it on the first entry.
struct PanickingSink;

impl Sink for PanickingSink {
    fn record(&mut self, _entry: &LogEntry) -> Result<(), SinkError> {
        panic!("sink blew up");
    }

    fn note(&mut self, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// An endpoint that fails mid-session halts forwarding; stop() reports it
/// and the bursts relayed before the failure are still logged.
#[tokio::test]
async fn test_endpoint_failure_is_surfaced() -> Result<()> {
    let mut s = session(FAST_IDLE);
    s.tee.start()?;

    s.a.inject(b"before");
    wait_until(Duration::from_secs(5), || s.b.written().len() == 6).await?;

    s.b.fail_reads(ErrorKind::NotConnected);
    tokio::time::timeout(Duration::from_secs(5), s.tee.halted()).await?;

    let err = s.tee.stop().await.unwrap_err();
    assert!(err.is_endpoint_failure());
    assert!(err.to_string().contains("endpoint B"), "{err}");

    let entries = s.sink.entries();
    assert_eq!(logged_bytes(&entries, Source::A), b"before");
    Ok(())
}

/// A failing write to the receiver halts the session too.
#[tokio::test]
async fn test_receiver_write_failure_is_surfaced() -> Result<()> {
    let mut s = session(FAST_IDLE);
    s.a.fail_writes(ErrorKind::BrokenPipe);
    s.tee.start()?;

    s.b.inject(b"to a");
    tokio::time::timeout(Duration::from_secs(5), s.tee.halted()).await?;

    let err = s.tee.stop().await.unwrap_err();
    assert!(err.to_string().contains("endpoint A write failed"), "{err}");

    // The burst was logged before the write failed, but never relayed
    let summary = s.tee.stop().await?;
    assert_eq!(summary.forwarded.get(Source::B).bytes, 0);
    assert_eq!(summary.logged.get(Source::B).bytes, 4);
    assert_eq!(logged_bytes(&s.sink.entries(), Source::B), b"to a");
    Ok(())
}

/// Once the log consumer is gone the forwarder cannot log, so it halts
/// with a queue error rather than relaying unlogged traffic.
#[tokio::test]
async fn test_lost_log_consumer_halts_forwarding() -> Result<()> {
    let (ep_a, a) = MemoryEndpoint::new();
    let (ep_b, b) = MemoryEndpoint::new();
    let options = TeeOptions {
        idle_interval: FAST_IDLE,
        ..TeeOptions::default()
    };
    let mut tee = Tee::new(PanickingSink, ep_a, ep_b, options);
    tee.start()?;

    // The first burst kills the consumer; a later one finds the queue closed
    let mut halted = false;
    for _ in 0..250 {
        a.inject(b"x");
        if tokio::time::timeout(Duration::from_millis(20), tee.halted())
            .await
            .is_ok()
        {
            halted = true;
            break;
        }
    }
    assert!(halted, "forwarder kept running without a log consumer");

    match tee.stop().await {
        Err(TeeError::LogQueue(_)) => {}
        other => panic!("expected a log queue error, got {other:?}"),
    }
    assert!(!b.written().is_empty());
    Ok(())
}

/// A sink that refuses entries never interrupts the relay.
#[tokio::test]
async fn test_rejecting_sink_does_not_block_relay() -> Result<()> {
    let mut s = session_with_sink(MemorySink::rejecting(), FAST_IDLE);
    s.tee.start()?;

    s.a.inject(b"still flowing");
    wait_until(Duration::from_secs(5), || s.b.written().len() == 13).await?;

    let summary = s.tee.stop().await?;
    assert_eq!(s.b.written(), b"still flowing");
    assert_eq!(summary.sink_failures, summary.forwarded.get(Source::A).segments);
    assert!(!summary.is_complete());
    Ok(())
}
