//! Collapse broadcast batching
//!
//! Carving a ring touches many chunks per tick. Sending each one to clients
//! as it changes is expensive, so changed chunks are buffered here and flushed
//! according to the profile's [`BroadcastMode`].

use std::collections::BTreeSet;

use glam::{IVec3, Vec3};

use crate::profile::{BroadcastMode, DimensionProfile};
use crate::{ChunkPos, horizontal_length};

/// Client-facing sync operations supplied by the host
pub trait ChunkSync {
    /// Resend a chunk's contents to clients that can see it
    fn send_chunk(&mut self, chunk: ChunkPos);
    /// Show the collapse border around `center`
    fn deploy_border(&mut self, center: IVec3, radius: f32);
    /// Bring clients' border state up to date
    fn sync_border(&mut self, center: IVec3);
}

/// Buffers chunk updates for one world
#[derive(Debug, Clone, Default)]
pub struct CollapseBroadcastManager {
    pending: BTreeSet<ChunkPos>,
    ticks_since_flush: u32,
    flushed_total: u64,
}

impl CollapseBroadcastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a chunk as changed
    pub fn queue(&mut self, chunk: ChunkPos) {
        self.pending.insert(chunk);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn flushed_total(&self) -> u64 {
        self.flushed_total
    }

    /// Flush whatever the current mode allows; returns chunks sent
    pub fn tick<S: ChunkSync>(
        &mut self,
        profile: &DimensionProfile,
        viewers: &[Vec3],
        sink: &mut S,
    ) -> usize {
        match profile.broadcast_mode {
            BroadcastMode::Immediate => {
                self.ticks_since_flush = 0;
                if self.pending.is_empty() {
                    return 0;
                }
                let chunks = std::mem::take(&mut self.pending);
                self.send(chunks, sink)
            }
            BroadcastMode::Delayed | BroadcastMode::Summary => {
                self.ticks_since_flush += 1;
                if self.ticks_since_flush < profile.broadcast_interval_ticks.max(1) {
                    return 0;
                }
                self.ticks_since_flush = 0;
                if self.pending.is_empty() {
                    return 0;
                }

                let radius = profile.broadcast_radius;
                let ready: BTreeSet<ChunkPos> = if radius <= 0.0 {
                    std::mem::take(&mut self.pending)
                } else {
                    let (near, far): (BTreeSet<_>, BTreeSet<_>) = std::mem::take(&mut self.pending)
                        .into_iter()
                        .partition(|chunk| near_any_viewer(*chunk, viewers, radius));
                    self.pending = far;
                    near
                };
                let sent = self.send(ready, sink);

                if profile.broadcast_mode == BroadcastMode::Summary {
                    log::info!(
                        "Collapse broadcast flushed {} chunks, {} still buffered",
                        sent,
                        self.pending.len()
                    );
                }
                sent
            }
        }
    }

    /// Border deployment pass-through, used once when the ring starts
    pub fn deploy_border<S: ChunkSync>(&mut self, sink: &mut S, center: IVec3, radius: f32) {
        sink.deploy_border(center, radius);
    }

    /// Border sync pass-through, used once when the ring ends
    pub fn sync_border<S: ChunkSync>(&mut self, sink: &mut S, center: IVec3) {
        sink.sync_border(center);
    }

    /// Drop everything buffered once the collapse is over; returns how many
    /// chunks were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.ticks_since_flush = 0;
        dropped
    }

    fn send<S: ChunkSync>(&mut self, chunks: BTreeSet<ChunkPos>, sink: &mut S) -> usize {
        let count = chunks.len();
        for chunk in chunks {
            sink.send_chunk(chunk);
        }
        self.flushed_total += count as u64;
        log::trace!("Flushed {} collapse chunks", count);
        count
    }
}

fn near_any_viewer(chunk: ChunkPos, viewers: &[Vec3], radius: f32) -> bool {
    viewers.iter().any(|viewer| {
        let center = chunk.center(viewer.y);
        horizontal_length(center - *viewer) <= radius
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<ChunkPos>,
        borders: Vec<(IVec3, Option<f32>)>,
    }

    impl ChunkSync for Recorder {
        fn send_chunk(&mut self, chunk: ChunkPos) {
            self.sent.push(chunk);
        }
        fn deploy_border(&mut self, center: IVec3, radius: f32) {
            self.borders.push((center, Some(radius)));
        }
        fn sync_border(&mut self, center: IVec3) {
            self.borders.push((center, None));
        }
    }

    fn profile(mode: BroadcastMode, radius: f32) -> DimensionProfile {
        DimensionProfile {
            broadcast_mode: mode,
            broadcast_radius: radius,
            broadcast_interval_ticks: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_immediate_flushes_every_tick() {
        let mut manager = CollapseBroadcastManager::new();
        let mut sink = Recorder::default();
        let profile = profile(BroadcastMode::Immediate, 0.0);

        assert_eq!(manager.tick(&profile, &[], &mut sink), 0);
        manager.queue(ChunkPos::new(0, 0));
        manager.queue(ChunkPos::new(0, 0));
        manager.queue(ChunkPos::new(1, 0));
        assert_eq!(manager.tick(&profile, &[], &mut sink), 2);
        assert_eq!(manager.pending(), 0);
        assert_eq!(sink.sent.len(), 2);
    }

    #[test]
    fn test_delayed_waits_for_interval() {
        let mut manager = CollapseBroadcastManager::new();
        let mut sink = Recorder::default();
        let profile = profile(BroadcastMode::Delayed, 0.0);
        manager.queue(ChunkPos::new(3, 3));

        for _ in 0..19 {
            assert_eq!(manager.tick(&profile, &[], &mut sink), 0);
        }
        assert_eq!(manager.tick(&profile, &[], &mut sink), 1);
        assert_eq!(manager.flushed_total(), 1);
    }

    #[test]
    fn test_delayed_only_flushes_near_viewers() {
        let mut manager = CollapseBroadcastManager::new();
        let mut sink = Recorder::default();
        let profile = profile(BroadcastMode::Summary, 40.0);
        manager.queue(ChunkPos::new(0, 0));
        manager.queue(ChunkPos::new(50, 50));

        let viewers = [Vec3::new(8.0, 70.0, 8.0)];
        let mut sent = 0;
        for _ in 0..20 {
            sent += manager.tick(&profile, &viewers, &mut sink);
        }
        assert_eq!(sent, 1);
        assert_eq!(sink.sent, vec![ChunkPos::new(0, 0)]);
        assert_eq!(manager.pending(), 1);

        // With nobody nearby the far chunk stays buffered
        for _ in 0..20 {
            manager.tick(&profile, &viewers, &mut sink);
        }
        assert_eq!(manager.pending(), 1);
    }

    #[test]
    fn test_border_pass_through() {
        let mut manager = CollapseBroadcastManager::new();
        let mut sink = Recorder::default();
        manager.deploy_border(&mut sink, IVec3::new(1, 2, 3), 20.0);
        manager.sync_border(&mut sink, IVec3::new(1, 2, 3));
        assert_eq!(
            sink.borders,
            vec![(IVec3::new(1, 2, 3), Some(20.0)), (IVec3::new(1, 2, 3), None)]
        );
    }
}
