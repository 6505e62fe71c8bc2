//! Singularity Collapse - a world-scale catastrophe simulation
//!
//! Core modules:
//! - `field`: Radial force fields (falloff curves, zones, phases, service)
//! - `collapse`: Singularity phase machine, effects and broadcast batching
//! - `growth`: Growth block definitions with typed mutations and overrides
//! - `scheduler`: Tick-keyed task queue shared by delayed work
//! - `sim`: Host traits, per-world orchestration and an in-memory sandbox
//! - `persistence`: Versioned save envelopes and stores
//! - `profile`: Data-driven dimension tuning

pub mod collapse;
pub mod error;
pub mod field;
pub mod growth;
pub mod persistence;
pub mod profile;
pub mod scheduler;
pub mod sim;

pub use error::{CollapseError, Result};
pub use profile::{BroadcastMode, DimensionProfile, ProfileRegistry};

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Simulation constants
pub mod consts {
    /// Scheduler steps per second in the reference host
    pub const TICKS_PER_SECOND: u32 = 20;

    /// Starting radius of the collapse ring (blocks)
    pub const RING_BASE_RADIUS: f32 = 8.0;
    /// Ring radius growth per elapsed ring tick (blocks)
    pub const RING_GROWTH_PER_TICK: f32 = 0.25;
    /// Half-width of the band around the ring where actors are pulled inward
    pub const RING_PULL_BAND: f32 = 6.0;

    /// Block edge length of a chunk column
    pub const CHUNK_SIZE: i32 = 16;
}

/// Opaque world identifier (dimension registry key)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldKey(pub String);

impl WorldKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chunk column coordinate (x, z in chunk units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given block column
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(consts::CHUNK_SIZE),
            z: z.div_euclid(consts::CHUNK_SIZE),
        }
    }

    /// World-space center of the chunk at the given height
    pub fn center(&self, y: f32) -> Vec3 {
        let half = consts::CHUNK_SIZE as f32 / 2.0;
        Vec3::new(
            (self.x * consts::CHUNK_SIZE) as f32 + half,
            y,
            (self.z * consts::CHUNK_SIZE) as f32 + half,
        )
    }
}

/// Center of a block in actor space
#[inline]
pub fn block_center(pos: IVec3) -> Vec3 {
    pos.as_vec3() + Vec3::splat(0.5)
}

/// Convert polar (r, theta) on the horizontal plane to an (x, z) offset
#[inline]
pub fn polar_to_horizontal(r: f32, theta: f32) -> (f32, f32) {
    (r * theta.cos(), r * theta.sin())
}

/// Horizontal (x, z) length of a vector
#[inline]
pub fn horizontal_length(v: Vec3) -> f32 {
    (v.x * v.x + v.z * v.z).sqrt()
}
