use crate::*;

use serialtee_core::TeeState;

/// Nothing queued before stop() is lost: after stop returns, every
/// forwarded segment is in the sink.
#[tokio::test]
async fn test_stop_drains_log_queue() -> Result<()> {
    let mut s = session(FAST_IDLE);
    s.tee.start()?;

    let data: Vec<u8> = (0..=255).collect();
    for chunk in data.chunks(10) {
        s.a.inject(chunk);
    }
    wait_until(Duration::from_secs(5), || s.a.pending() == 0).await?;

    let summary = s.tee.stop().await?;
    assert_eq!(s.tee.state(), TeeState::Stopped);

    let entries = s.sink.entries();
    assert_eq!(
        entries.len() as u64,
        summary.forwarded.get(Source::A).segments
    );
    assert_eq!(logged_bytes(&entries, Source::A), s.b.written());
    assert_eq!(s.sink.flushes(), 1, "consumer flushed once on exit");
    Ok(())
}

/// Idle endpoints are polled at the idle interval, not in a hot loop.
#[tokio::test]
async fn test_idle_endpoints_do_not_spin() -> Result<()> {
    let mut s = session(Duration::from_millis(10));
    s.tee.start()?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    s.tee.stop().await?;

    // Each round sleeps once per direction, so ~10 rounds fit in 200 ms.
    let polls = s.a.polls();
    assert!(polls >= 1, "forwarder never polled");
    assert!(polls < 100, "forwarder spun: {polls} polls in 200 ms");
    assert!(s.sink.entries().is_empty());
    Ok(())
}

/// Dropping a running tee stops both workers before drop returns.
#[tokio::test]
async fn test_drop_stops_session() -> Result<()> {
    let s = session(FAST_IDLE);
    let Session { mut tee, a, b, sink } = s;
    tee.start()?;
    a.inject(b"bye");
    wait_until(Duration::from_secs(5), || b.written().len() == 3).await?;

    drop(tee);

    let polls_after_drop = a.polls();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(a.polls(), polls_after_drop, "forwarder still running");
    assert_eq!(sink.entries().len(), 1);
    Ok(())
}

/// stop() is idempotent and start() cannot revive a stopped session.
#[tokio::test]
async fn test_lifecycle_is_linear() -> Result<()> {
    let mut s = session(FAST_IDLE);
    assert_eq!(s.tee.state(), TeeState::Created);
    s.tee.start()?;
    assert_eq!(s.tee.state(), TeeState::Running);

    let first = s.tee.stop().await?;
    let second = s.tee.stop().await?;
    assert_eq!(first, second);
    assert!(s.tee.start().is_err());
    assert_eq!(s.tee.state(), TeeState::Stopped);
    Ok(())
}
