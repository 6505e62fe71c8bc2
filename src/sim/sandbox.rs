//! In-memory host world
//!
//! A flat world with point actors and no terrain. Effects, chunk sends and
//! border calls are recorded so tests and the headless driver can inspect
//! what the simulation asked for.

use std::collections::BTreeSet;

use glam::{IVec3, Vec3};

use super::world::{ActorWorld, CollapseWorld, ForceTarget};
use crate::collapse::{ChunkSync, CollapseEffect, EffectSink};
use crate::{ChunkPos, WorldKey};

/// A point actor
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxActor {
    pub position: Vec3,
    pub velocity: Vec3,
    pub on_ground: bool,
    pub alive: bool,
    pub spectator: bool,
    /// Times fall distance was reset by a field
    pub fall_resets: u32,
}

impl SandboxActor {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            on_ground: false,
            alive: true,
            spectator: false,
            fall_resets: 0,
        }
    }
}

impl ForceTarget for SandboxActor {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn on_ground(&self) -> bool {
        self.on_ground
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn is_spectator(&self) -> bool {
        self.spectator
    }

    fn reset_fall_distance(&mut self) {
        self.fall_resets += 1;
    }
}

/// Border call seen by the sandbox
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderCall {
    Deploy { center: IVec3, radius: f32 },
    Sync { center: IVec3 },
}

/// Scriptable world for tests and demos
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    key: WorldKey,
    game_time: u64,
    actors: Vec<SandboxActor>,

    pub infection_health: f32,
    /// Absolute tick of the final infection wave
    pub final_wave_tick: Option<u64>,
    pub start_reset: bool,
    /// Reset steps left before the reset reports completion
    pub reset_steps: u32,
    /// Loaded chunks; `None` means everything is loaded
    pub loaded_chunks: Option<BTreeSet<ChunkPos>>,
    pub viewers: Vec<Vec3>,

    pub effects: Vec<CollapseEffect>,
    pub sent_chunks: Vec<ChunkPos>,
    pub borders: Vec<BorderCall>,
}

impl SandboxWorld {
    pub fn new(key: &str) -> Self {
        Self {
            key: WorldKey::new(key),
            game_time: 0,
            actors: Vec::new(),
            infection_health: 100.0,
            final_wave_tick: None,
            start_reset: false,
            reset_steps: 0,
            loaded_chunks: None,
            viewers: Vec::new(),
            effects: Vec::new(),
            sent_chunks: Vec::new(),
            borders: Vec::new(),
        }
    }

    pub fn add_actor(&mut self, actor: SandboxActor) {
        self.actors.push(actor);
    }

    pub fn actors(&self) -> &[SandboxActor] {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut [SandboxActor] {
        &mut self.actors
    }

    /// Move the clock forward one tick
    pub fn advance(&mut self) {
        self.game_time += 1;
    }

    /// Move actors by their velocity, with a little drag
    pub fn integrate(&mut self) {
        for actor in &mut self.actors {
            actor.position += actor.velocity;
            actor.velocity *= 0.98;
        }
    }

    /// Count recorded effects matching `predicate`
    pub fn count_effects(&self, predicate: impl Fn(&CollapseEffect) -> bool) -> usize {
        self.effects.iter().filter(|e| predicate(e)).count()
    }
}

impl ActorWorld for SandboxWorld {
    type Actor = SandboxActor;

    fn key(&self) -> &WorldKey {
        &self.key
    }

    fn game_time(&self) -> u64 {
        self.game_time
    }

    fn actors_within(&mut self, center: Vec3, radius: f32) -> Vec<&mut SandboxActor> {
        self.actors
            .iter_mut()
            .filter(|a| a.position.distance(center) <= radius)
            .collect()
    }
}

impl EffectSink for SandboxWorld {
    fn apply_effect(&mut self, effect: &CollapseEffect) -> bool {
        if matches!(effect, CollapseEffect::ProcessReset) {
            self.reset_steps = self.reset_steps.saturating_sub(1);
        }
        self.effects.push(effect.clone());
        true
    }
}

impl ChunkSync for SandboxWorld {
    fn send_chunk(&mut self, chunk: ChunkPos) {
        self.sent_chunks.push(chunk);
    }

    fn deploy_border(&mut self, center: IVec3, radius: f32) {
        self.borders.push(BorderCall::Deploy { center, radius });
    }

    fn sync_border(&mut self, center: IVec3) {
        self.borders.push(BorderCall::Sync { center });
    }
}

impl CollapseWorld for SandboxWorld {
    fn infection_health(&self) -> f32 {
        self.infection_health
    }

    fn ticks_until_final_wave(&self) -> Option<i64> {
        self.final_wave_tick.map(|at| at as i64 - self.game_time as i64)
    }

    fn should_start_reset(&self) -> bool {
        self.start_reset
    }

    fn reset_complete(&self) -> bool {
        self.reset_steps == 0
    }

    fn viewer_positions(&self) -> Vec<Vec3> {
        self.viewers.clone()
    }

    fn is_chunk_loaded(&self, chunk: ChunkPos) -> bool {
        self.loaded_chunks
            .as_ref()
            .is_none_or(|loaded| loaded.contains(&chunk))
    }
}
