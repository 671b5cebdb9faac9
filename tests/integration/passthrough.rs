use crate::*;

/// "ABC" from A arrives at B and is logged once, as hex.
#[tokio::test]
async fn test_single_burst_a_to_b() -> Result<()> {
    let mut s = session(FAST_IDLE);
    s.tee.start()?;

    s.a.inject(&[0x41, 0x42, 0x43]);
    wait_until(Duration::from_secs(5), || s.b.written().len() == 3).await?;

    let summary = s.tee.stop().await?;
    assert_eq!(s.b.written(), vec![0x41, 0x42, 0x43]);
    assert!(s.a.written().is_empty(), "nothing flows back to A");

    let entries = s.sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, Source::A);
    assert_eq!(entries[0].payload, "41 42 43 ");
    assert!(entries[0].timestamp >= 0.0);

    assert_eq!(summary.forwarded.get(Source::A).bytes, 3);
    assert!(summary.is_complete());
    Ok(())
}

/// 20 bytes each way at once: two chunks per direction, order preserved.
#[tokio::test]
async fn test_simultaneous_twenty_bytes_each_way() -> Result<()> {
    let mut s = session(FAST_IDLE);
    let from_a: Vec<u8> = (0..20).collect();
    let from_b: Vec<u8> = (100..120).collect();
    s.a.inject(&from_a);
    s.b.inject(&from_b);

    s.tee.start()?;
    wait_until(Duration::from_secs(5), || {
        s.a.written().len() == 20 && s.b.written().len() == 20
    })
    .await?;
    s.tee.stop().await?;

    assert_eq!(s.b.written(), from_a);
    assert_eq!(s.a.written(), from_b);
    assert!(s.b.write_bursts().len() <= 2);
    assert!(s.a.write_bursts().len() <= 2);

    let entries = s.sink.entries();
    for (source, sent) in [(Source::A, &from_a), (Source::B, &from_b)] {
        let logged = entries_from(&entries, source);
        assert_eq!(logged.len(), 2, "two segments from {source}");
        assert_eq!(hex_bytes(&logged[0].payload).len(), 16);
        assert_eq!(hex_bytes(&logged[1].payload).len(), 4);
        assert_eq!(&logged_bytes(&entries, source), sent);
    }
    Ok(())
}

/// Many bursts in both directions: relayed bytes equal logged bytes per
/// direction, and per-direction timestamps never go backwards.
#[tokio::test]
async fn test_relayed_equals_logged_per_direction() -> Result<()> {
    let mut s = session(FAST_IDLE);
    s.tee.start()?;

    let mut sent_a = Vec::new();
    let mut sent_b = Vec::new();
    for round in 0..40u32 {
        let len_a = (round * 7 % 23 + 1) as usize;
        let len_b = (round * 5 % 31 + 1) as usize;
        let burst_a: Vec<u8> = (0..len_a).map(|i| (round as usize + i) as u8).collect();
        let burst_b: Vec<u8> = (0..len_b).map(|i| (round as usize * 3 + i) as u8).collect();
        s.a.inject(&burst_a);
        s.b.inject(&burst_b);
        sent_a.extend_from_slice(&burst_a);
        sent_b.extend_from_slice(&burst_b);
        if round % 8 == 0 {
            tokio::time::sleep(Duration::from_millis(3)).await;
        }
    }

    let (want_a, want_b) = (sent_a.len(), sent_b.len());
    wait_until(Duration::from_secs(10), || {
        s.b.written().len() == want_a && s.a.written().len() == want_b
    })
    .await?;
    let summary = s.tee.stop().await?;

    assert_eq!(s.b.written(), sent_a);
    assert_eq!(s.a.written(), sent_b);

    let entries = s.sink.entries();
    assert_eq!(logged_bytes(&entries, Source::A), sent_a);
    assert_eq!(logged_bytes(&entries, Source::B), sent_b);
    assert_eq!(summary.forwarded, summary.logged);

    for source in Source::ALL {
        let stamps: Vec<f64> = entries_from(&entries, source)
            .iter()
            .map(|e| e.timestamp)
            .collect();
        assert!(
            stamps.windows(2).all(|w| w[0] <= w[1]),
            "timestamps from {source} went backwards: {stamps:?}"
        );
        for e in entries_from(&entries, source) {
            assert!(hex_bytes(&e.payload).len() <= serialtee_core::CHUNK_CAPACITY);
        }
    }
    Ok(())
}
