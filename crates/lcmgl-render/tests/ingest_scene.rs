use std::thread;
use std::time::Duration;

use lcmgl_protocol::{CmdWriter, PrimitiveMode};
use lcmgl_render::ingest::{self, Envelope, Offer};
use lcmgl_render::{
    DecodeErrorKind, DecodeOutcome, Decoder, IngestConfig, RecordedCall, RecordingContext, Retained,
    SceneCache,
};
use pretty_assertions::assert_eq;

fn points(channel: &str, scene: i32, sequence: i32, n: usize) -> Envelope {
    let mut w = CmdWriter::new();
    w.begin(PrimitiveMode::Points);
    for i in 0..n {
        w.vertex2f(i as f32, 0.0);
    }
    w.end();
    Envelope {
        channel: channel.into(),
        scene,
        sequence,
        data: w.finish(),
    }
}

#[test]
fn pump_decodes_in_arrival_order_on_calling_thread() {
    let (tx, rx) = ingest::channel(&IngestConfig::new(16).unwrap());

    let producer = {
        let tx = tx.clone();
        thread::spawn(move || {
            for seq in 0..8 {
                assert_eq!(tx.offer(points("robot", 1, seq, 1)), Offer::Accepted);
            }
        })
    };
    producer.join().unwrap();

    let decoder = Decoder::default();
    let mut ctx = RecordingContext::new();
    let mut seen = Vec::new();
    let n = rx.pump(&decoder, &mut ctx, |envelope, outcome| {
        assert!(outcome.is_ok());
        seen.push(envelope.sequence);
    });

    assert_eq!(n, 8);
    assert_eq!(seen, (0..8).collect::<Vec<_>>());
    assert_eq!(ctx.calls().len(), 8 * 3);
    assert_eq!(decoder.stats().snapshot().buffers_ok, 8);
    assert_eq!(tx.stats().accepted, 8);
}

#[test]
fn pump_stops_at_buffers_queued_when_called() {
    let (tx, rx) = ingest::channel(&IngestConfig::new(16).unwrap());
    tx.offer(points("feed", 1, 0, 1));
    tx.offer(points("feed", 1, 1, 1));
    assert_eq!(rx.queued(), 2);

    let decoder = Decoder::default();
    let mut ctx = RecordingContext::new();
    let mut next = 2;
    let mut refill = |_: Envelope, _: DecodeOutcome| {
        // Each decoded buffer is immediately followed by a fresh one.
        assert_eq!(tx.offer(points("feed", 1, next, 1)), Offer::Accepted);
        next += 1;
    };
    assert_eq!(rx.pump(&decoder, &mut ctx, &mut refill), 2);
    assert_eq!(rx.queued(), 2);

    assert_eq!(rx.pump(&decoder, &mut ctx, &mut refill), 2);
    assert_eq!(rx.queued(), 2);
    assert_eq!(decoder.stats().snapshot().buffers_ok, 4);
}

#[test]
fn full_queue_counts_drops_and_keeps_earlier_buffers() {
    let (tx, rx) = ingest::channel(&IngestConfig::new(2).unwrap());
    let offers: Vec<Offer> = (0..5).map(|seq| tx.offer(points("a", 0, seq, 1))).collect();
    assert_eq!(
        offers,
        vec![
            Offer::Accepted,
            Offer::Accepted,
            Offer::Dropped,
            Offer::Dropped,
            Offer::Dropped
        ]
    );
    assert_eq!(tx.stats().dropped, 3);

    let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(first.sequence, 0);
    // Space freed by the receive is usable again.
    assert_eq!(tx.offer(points("a", 0, 5, 1)), Offer::Accepted);
}

#[test]
fn scene_cache_redraws_current_scenes() {
    let (tx, rx) = ingest::channel(&IngestConfig::default());
    tx.offer(points("b", 1, 0, 1));
    tx.offer(points("a", 4, 0, 2));
    tx.offer(points("b", 1, 1, 1));
    tx.offer(points("b", 2, 2, 3));

    let decoder = Decoder::default();
    let mut cache = SceneCache::new();
    let mut live = RecordingContext::new();
    let mut retained = Vec::new();
    rx.pump(&decoder, &mut live, |envelope, _| {
        retained.push(cache.retain(envelope));
    });
    assert_eq!(
        retained,
        vec![
            Retained::NewScene { discarded: 0 },
            Retained::NewScene { discarded: 0 },
            Retained::Appended,
            Retained::NewScene { discarded: 2 },
        ]
    );

    let mut repaint = RecordingContext::new();
    let mut order = Vec::new();
    let n = cache.redraw(&decoder, &mut repaint, |envelope, outcome| {
        assert!(outcome.is_ok());
        order.push((envelope.channel.clone(), envelope.scene));
    });
    assert_eq!(n, 2);
    assert_eq!(order, vec![("a".to_string(), 4), ("b".to_string(), 2)]);
    // Two vertices from channel "a", then three from the new scene on "b".
    let vertices = repaint
        .calls()
        .iter()
        .filter(|c| matches!(c, RecordedCall::Vertex(_)))
        .count();
    assert_eq!(vertices, 5);
}

#[test]
fn failed_buffers_stay_retained() {
    let mut cache = SceneCache::new();
    let mut bad = CmdWriter::new();
    bad.push_matrix();
    cache.retain(Envelope {
        channel: "c".into(),
        scene: 0,
        sequence: 0,
        data: bad.finish(),
    });

    let decoder = Decoder::default();
    for _ in 0..2 {
        let mut kinds = Vec::new();
        let mut ctx = RecordingContext::new();
        cache.redraw(&decoder, &mut ctx, |_, outcome| {
            kinds.push(outcome.unwrap_err().kind);
        });
        assert_eq!(kinds, vec![DecodeErrorKind::UnbalancedStack { depth: 1 }]);
    }
    assert_eq!(decoder.stats().snapshot().buffers_failed, 2);
}
