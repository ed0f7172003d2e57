//! Handoff of raw buffers from the messaging thread to the render thread.
//!
//! The sending half never blocks: when the queue is full the new buffer is
//! dropped and counted. The receiving half is meant to be owned by the thread
//! that owns the render context, which drains it with [`IngestReceiver::pump`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::IngestConfig;
use crate::context::RenderContext;
use crate::decode::{DecodeOutcome, Decoder};

/// One buffer as delivered by the messaging layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub channel: String,
    /// Scene number; a change starts a new scene on the channel.
    pub scene: i32,
    pub sequence: i32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// The queue was full; the buffer was discarded.
    Dropped,
    /// The receiver is gone.
    Disconnected,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStatsSnapshot {
    pub accepted: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
pub struct IngestStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
    // Raised before a send and lowered after a receive, so it never reads
    // below the number of buffers actually in the queue.
    queued: AtomicUsize,
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        IngestStatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Create a bounded queue sized by `config.queue_capacity()`.
pub fn channel(config: &IngestConfig) -> (IngestSender, IngestReceiver) {
    let (tx, rx) = mpsc::sync_channel(config.queue_capacity());
    let stats = Arc::new(IngestStats::default());
    (
        IngestSender {
            tx,
            stats: Arc::clone(&stats),
        },
        IngestReceiver { rx, stats },
    )
}

#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: SyncSender<Envelope>,
    stats: Arc<IngestStats>,
}

impl IngestSender {
    pub fn offer(&self, envelope: Envelope) -> Offer {
        self.stats.queued.fetch_add(1, Ordering::AcqRel);
        let sent = self.tx.try_send(envelope);
        if sent.is_err() {
            self.stats.queued.fetch_sub(1, Ordering::AcqRel);
        }
        match sent {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Offer::Accepted
            }
            Err(TrySendError::Full(envelope)) => {
                let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    channel = %envelope.channel,
                    scene = envelope.scene,
                    sequence = envelope.sequence,
                    len = envelope.data.len(),
                    dropped,
                    "ingest queue full; dropping buffer"
                );
                Offer::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Offer::Disconnected,
        }
    }

    pub fn stats(&self) -> IngestStatsSnapshot {
        self.stats.snapshot()
    }
}

#[derive(Debug)]
pub struct IngestReceiver {
    rx: Receiver<Envelope>,
    stats: Arc<IngestStats>,
}

impl IngestReceiver {
    /// Next queued buffer, if any, without waiting.
    pub fn try_recv(&self) -> Option<Envelope> {
        match self.rx.try_recv() {
            Ok(envelope) => {
                self.stats.queued.fetch_sub(1, Ordering::AcqRel);
                Some(envelope)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next buffer.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Envelope, RecvTimeoutError> {
        let envelope = self.rx.recv_timeout(timeout)?;
        self.stats.queued.fetch_sub(1, Ordering::AcqRel);
        Ok(envelope)
    }

    /// Buffers waiting in the queue. May briefly overcount while a sender is
    /// mid-offer.
    pub fn queued(&self) -> usize {
        self.stats.queued.load(Ordering::Acquire)
    }

    /// Decode the buffers queued at the time of the call, in arrival order, on
    /// the calling thread.
    ///
    /// Buffers offered while the pump runs wait for the next call, so a busy
    /// producer cannot hold the render thread here. `on_outcome` receives each
    /// envelope after it has been decoded, so the caller can retain it (see
    /// [`SceneCache`](crate::SceneCache)). Returns the number of buffers
    /// decoded.
    pub fn pump<C, F>(&self, decoder: &Decoder, context: &mut C, mut on_outcome: F) -> usize
    where
        C: RenderContext + ?Sized,
        F: FnMut(Envelope, DecodeOutcome),
    {
        let pending = self.queued();
        let mut n = 0;
        while n < pending {
            let Some(envelope) = self.try_recv() else {
                break;
            };
            let outcome = decoder.decode(&envelope.data, context);
            on_outcome(envelope, outcome);
            n += 1;
        }
        n
    }

    pub fn stats(&self) -> IngestStatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(sequence: i32) -> Envelope {
        Envelope {
            channel: "test".into(),
            scene: 0,
            sequence,
            data: Vec::new(),
        }
    }

    #[test]
    fn full_queue_drops_newest() {
        let (tx, rx) = channel(&IngestConfig::new(2).unwrap());
        assert_eq!(tx.offer(envelope(0)), Offer::Accepted);
        assert_eq!(tx.offer(envelope(1)), Offer::Accepted);
        assert_eq!(tx.offer(envelope(2)), Offer::Dropped);

        assert_eq!(rx.queued(), 2);
        assert_eq!(rx.try_recv().unwrap().sequence, 0);
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert!(rx.try_recv().is_none());
        assert_eq!(rx.queued(), 0);
        assert_eq!(
            rx.stats(),
            IngestStatsSnapshot {
                accepted: 2,
                dropped: 1
            }
        );
    }

    #[test]
    fn offer_after_receiver_drop_is_disconnected() {
        let (tx, rx) = channel(&IngestConfig::default());
        drop(rx);
        assert_eq!(tx.offer(envelope(0)), Offer::Disconnected);
        assert_eq!(tx.stats.queued.load(Ordering::Acquire), 0);
    }
}
