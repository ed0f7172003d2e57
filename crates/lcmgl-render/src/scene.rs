//! Per-channel retention of the current scene's buffers.
//!
//! Clients redraw a scene by sending its buffers again under a new scene
//! number. The host keeps the latest scene of each channel and replays it on
//! every repaint. Without a limit a channel that never changes its scene
//! number grows without bound; [`SceneCache::with_buffer_limit`] caps it.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use tracing::debug;

use crate::context::RenderContext;
use crate::decode::{DecodeOutcome, Decoder};
use crate::ingest::Envelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retained {
    /// Appended to the channel's current scene.
    Appended,
    /// Started a new scene; the previous scene's buffers were discarded.
    NewScene { discarded: usize },
}

#[derive(Debug, Default)]
struct ChannelScene {
    scene: i32,
    buffers: Vec<Envelope>,
}

#[derive(Debug, Default)]
pub struct SceneCache {
    channels: BTreeMap<String, ChannelScene>,
    buffer_limit: Option<NonZeroUsize>,
    evicted: u64,
}

impl SceneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` buffers per channel, dropping the oldest of the
    /// current scene when an append would exceed it.
    pub fn with_buffer_limit(limit: NonZeroUsize) -> Self {
        Self {
            buffer_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn buffer_limit(&self) -> Option<NonZeroUsize> {
        self.buffer_limit
    }

    /// Buffers dropped so far to stay within the per-channel limit.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn retain(&mut self, envelope: Envelope) -> Retained {
        let Some(entry) = self.channels.get_mut(&envelope.channel) else {
            debug!(channel = %envelope.channel, scene = envelope.scene, "new channel");
            self.channels.insert(
                envelope.channel.clone(),
                ChannelScene {
                    scene: envelope.scene,
                    buffers: vec![envelope],
                },
            );
            return Retained::NewScene { discarded: 0 };
        };

        if entry.scene == envelope.scene {
            if let Some(limit) = self.buffer_limit {
                let len = entry.buffers.len();
                if len >= limit.get() {
                    let drop_count = len + 1 - limit.get();
                    entry.buffers.drain(..drop_count);
                    self.evicted += drop_count as u64;
                    debug!(
                        channel = %envelope.channel,
                        scene = envelope.scene,
                        drop_count,
                        evicted = self.evicted,
                        "scene buffer limit reached; dropping oldest"
                    );
                }
            }
            entry.buffers.push(envelope);
            return Retained::Appended;
        }

        let discarded = entry.buffers.len();
        debug!(
            channel = %envelope.channel,
            old_scene = entry.scene,
            scene = envelope.scene,
            discarded,
            "scene reset"
        );
        entry.scene = envelope.scene;
        entry.buffers.clear();
        entry.buffers.push(envelope);
        Retained::NewScene { discarded }
    }

    /// Decode every retained buffer, channels in name order and buffers in
    /// arrival order. Returns the number of buffers decoded.
    pub fn redraw<C, F>(&self, decoder: &Decoder, context: &mut C, mut on_outcome: F) -> usize
    where
        C: RenderContext + ?Sized,
        F: FnMut(&Envelope, DecodeOutcome),
    {
        let mut n = 0;
        for envelope in self.channels.values().flat_map(|c| c.buffers.iter()) {
            let outcome = decoder.decode(&envelope.data, context);
            on_outcome(envelope, outcome);
            n += 1;
        }
        n
    }

    /// Current scene number of `channel`.
    pub fn scene(&self, channel: &str) -> Option<i32> {
        self.channels.get(channel).map(|c| c.scene)
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn buffer_count(&self) -> usize {
        self.channels.values().map(|c| c.buffers.len()).sum()
    }

    /// Forget a channel entirely. Returns whether it was present.
    pub fn remove_channel(&mut self, channel: &str) -> bool {
        self.channels.remove(channel).is_some()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(channel: &str, scene: i32, sequence: i32) -> Envelope {
        Envelope {
            channel: channel.into(),
            scene,
            sequence,
            data: Vec::new(),
        }
    }

    #[test]
    fn same_scene_appends_and_new_scene_replaces() {
        let mut cache = SceneCache::new();
        assert_eq!(
            cache.retain(envelope("a", 1, 0)),
            Retained::NewScene { discarded: 0 }
        );
        assert_eq!(cache.retain(envelope("a", 1, 1)), Retained::Appended);
        assert_eq!(
            cache.retain(envelope("a", 2, 2)),
            Retained::NewScene { discarded: 2 }
        );
        assert_eq!(cache.scene("a"), Some(2));
        assert_eq!(cache.buffer_count(), 1);
    }

    #[test]
    fn buffer_limit_drops_oldest_of_current_scene() {
        let mut cache = SceneCache::with_buffer_limit(NonZeroUsize::new(2).unwrap());
        for seq in 0..5 {
            cache.retain(envelope("a", 1, seq));
        }
        cache.retain(envelope("b", 1, 0));
        assert_eq!(cache.buffer_count(), 3);
        assert_eq!(cache.evicted(), 3);

        let kept: Vec<i32> = cache.channels["a"].buffers.iter().map(|e| e.sequence).collect();
        assert_eq!(kept, vec![3, 4]);

        // A scene change clears rather than evicts.
        cache.retain(envelope("a", 2, 5));
        assert_eq!(cache.evicted(), 3);
        assert_eq!(cache.buffer_count(), 2);
    }

    #[test]
    fn unlimited_by_default() {
        let mut cache = SceneCache::new();
        for seq in 0..100 {
            cache.retain(envelope("a", 1, seq));
        }
        assert_eq!(cache.buffer_limit(), None);
        assert_eq!(cache.buffer_count(), 100);
        assert_eq!(cache.evicted(), 0);
    }

    #[test]
    fn channels_are_independent_and_ordered_by_name() {
        let mut cache = SceneCache::new();
        cache.retain(envelope("zeta", 1, 0));
        cache.retain(envelope("alpha", 7, 0));
        cache.retain(envelope("zeta", 1, 1));
        assert_eq!(cache.channels().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
        assert_eq!(cache.buffer_count(), 3);

        assert!(cache.remove_channel("zeta"));
        assert!(!cache.remove_channel("zeta"));
        assert_eq!(cache.buffer_count(), 1);
    }
}
