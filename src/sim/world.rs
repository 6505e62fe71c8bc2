//! Host-facing traits
//!
//! The simulation never owns actors, terrain or network connections. A host
//! world exposes just enough through these traits for force application,
//! phase inputs and effect delivery.

use glam::Vec3;

use crate::collapse::broadcast::ChunkSync;
use crate::collapse::effects::EffectSink;
use crate::{ChunkPos, WorldKey};

/// An actor a force can act on
pub trait ForceTarget {
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn on_ground(&self) -> bool;
    fn is_alive(&self) -> bool;
    fn is_spectator(&self) -> bool;
    /// Clear accumulated fall distance so held actors take no fall damage
    fn reset_fall_distance(&mut self);
}

/// A world that can be queried for actors
pub trait ActorWorld {
    type Actor: ForceTarget;

    fn key(&self) -> &WorldKey;

    /// Current scheduler tick of this world
    fn game_time(&self) -> u64;

    /// Actors whose position lies within `radius` of `center`
    fn actors_within(&mut self, center: Vec3, radius: f32) -> Vec<&mut Self::Actor>;
}

/// Everything the collapse phase machine needs from its world
pub trait CollapseWorld: ActorWorld + EffectSink + ChunkSync {
    /// Remaining infection health; the singularity fuses once this reaches 0
    fn infection_health(&self) -> f32;

    /// Ticks until the final infection wave, if one is scheduled
    fn ticks_until_final_wave(&self) -> Option<i64>;

    /// Whether a finished collapse should hand over to the post-collapse reset
    fn should_start_reset(&self) -> bool;

    /// Whether the post-collapse reset has finished its work
    fn reset_complete(&self) -> bool;

    /// Positions of connected viewers, for radius-gated broadcasts
    fn viewer_positions(&self) -> Vec<Vec3>;

    fn is_chunk_loaded(&self, chunk: ChunkPos) -> bool;
}
