//! Per-world simulation tick
//!
//! `Simulation` owns everything that outlives a single tick: the force-field
//! registry, each world's singularity and broadcast buffer, growth overrides
//! and the mutation scheduler. The host calls [`Simulation::on_world_tick`]
//! once per world per scheduler step, then [`Simulation::save_dirty`].

use std::collections::BTreeMap;

use glam::{IVec3, Vec3};

use super::world::{ActorWorld, CollapseWorld, ForceTarget};
use crate::collapse::{
    CollapseBroadcastManager, CollapseEffect, EffectSink, PhaseKind, SingularityState, TickInput,
    step,
};
use crate::consts::RING_PULL_BAND;
use crate::error::Result;
use crate::field::{FalloffCurve, FieldEvent, FieldId, ForceFieldService, ForceZone};
use crate::growth::{GrowthBlockDefinition, GrowthMutation, GrowthOverrides, ScheduledMutation};
use crate::persistence::{
    GrowthEntry, SCHEDULER_KEY, SaveStore, SchedulerSave, WorldSave, world_key,
};
use crate::profile::ProfileRegistry;
use crate::scheduler::TickScheduler;
use crate::{ChunkPos, WorldKey, block_center, horizontal_length};

/// What happened during one world tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldTickReport {
    pub field_events: Vec<FieldEvent>,
    pub transition: Option<(PhaseKind, PhaseKind)>,
    /// Effects the world accepted
    pub effects_applied: usize,
    /// Carve requests skipped because their chunk was not loaded
    pub columns_skipped: usize,
    pub chunks_flushed: usize,
    pub mutations_applied: usize,
}

/// State kept for one registered world
#[derive(Debug, Default)]
struct WorldSlot {
    singularity: Option<SingularityState>,
    broadcast: CollapseBroadcastManager,
    growth: BTreeMap<[i32; 3], GrowthOverrides>,
    dirty: bool,
}

impl WorldSlot {
    fn to_save(&self) -> WorldSave {
        WorldSave {
            singularity: self.singularity.map(|s| s.to_record()),
            growth: self
                .growth
                .iter()
                .filter(|(_, o)| !o.is_empty())
                .map(|(pos, overrides)| GrowthEntry {
                    pos: *pos,
                    overrides: overrides.clone(),
                })
                .collect(),
        }
    }
}

/// Host-owned simulation context
#[derive(Debug)]
pub struct Simulation {
    profiles: ProfileRegistry,
    fields: ForceFieldService,
    worlds: BTreeMap<WorldKey, WorldSlot>,
    mutations: TickScheduler<ScheduledMutation>,
    scheduler_dirty: bool,
    seed: u64,
}

impl Simulation {
    pub fn new(profiles: ProfileRegistry, seed: u64) -> Self {
        Self {
            profiles,
            fields: ForceFieldService::new(),
            worlds: BTreeMap::new(),
            mutations: TickScheduler::new(),
            scheduler_dirty: false,
            seed,
        }
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Profiles may be swapped at any time; the next tick reads the new values
    pub fn profiles_mut(&mut self) -> &mut ProfileRegistry {
        &mut self.profiles
    }

    pub fn fields(&self) -> &ForceFieldService {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut ForceFieldService {
        &mut self.fields
    }

    /// Make a world known; scheduled work for unknown worlds is dropped
    pub fn register_world(&mut self, key: WorldKey) {
        self.worlds.entry(key).or_default();
    }

    /// Forget a world and every field in it
    pub fn unregister_world(&mut self, key: &WorldKey) -> bool {
        let removed = self.fields.remove_all(key);
        if removed > 0 {
            log::debug!("Removed {} fields with {}", removed, key);
        }
        self.worlds.remove(key).is_some()
    }

    pub fn is_registered(&self, key: &WorldKey) -> bool {
        self.worlds.contains_key(key)
    }

    pub fn singularity(&self, key: &WorldKey) -> Option<&SingularityState> {
        self.worlds.get(key)?.singularity.as_ref()
    }

    pub fn pending_chunks(&self, key: &WorldKey) -> usize {
        self.worlds.get(key).map_or(0, |slot| slot.broadcast.pending())
    }

    pub fn pending_mutations(&self) -> usize {
        self.mutations.len()
    }

    /// Anchor the world's singularity at an infection origin
    ///
    /// Creates the state on first use. A singularity that is already running
    /// keeps its center.
    pub fn begin_infection(&mut self, key: &WorldKey, center: IVec3) {
        let seed = world_seed(self.seed, key);
        let slot = self.worlds.entry(key.clone()).or_default();
        if let Some(state) = slot.singularity.as_mut() {
            if let Some(existing) = state.center {
                log::debug!("{} already has a singularity at {}", key, existing);
                return;
            }
            state.center = Some(center);
        } else {
            slot.singularity = Some(SingularityState::new(center, seed));
        }
        slot.dirty = true;
        log::info!("Singularity anchored in {} at {}", key, center);
    }

    /// Advance one world by one tick
    pub fn on_world_tick<W: CollapseWorld>(&mut self, world: &mut W) -> WorldTickReport {
        let key = world.key().clone();
        let profile = self.profiles.get(&key).clone();
        let mut report = WorldTickReport {
            field_events: self.fields.tick(world),
            ..Default::default()
        };

        let slot = self.worlds.entry(key.clone()).or_default();
        if let Some(state) = slot.singularity.filter(SingularityState::is_active) {
            let input = TickInput {
                infection_health: world.infection_health(),
                ticks_until_final_wave: world.ticks_until_final_wave(),
                should_start_reset: world.should_start_reset(),
                reset_complete: world.reset_complete(),
            };
            let result = step(&state, &input, &profile);
            if let Some((from, to)) = result.transition {
                log::info!("Singularity in {} {} -> {}", key, from, to);
            }
            for effect in &result.effects {
                route_effect(world, &mut slot.broadcast, effect, &mut report);
            }
            if result.changed_from(&state) {
                slot.dirty = true;
            }
            report.transition = result.transition;
            slot.singularity = Some(result.state);
        }

        let viewers = world.viewer_positions();
        report.chunks_flushed = slot.broadcast.tick(&profile, &viewers, world);
        if matches!(report.transition, Some((_, PhaseKind::Dormant))) {
            let dropped = slot.broadcast.clear();
            if dropped > 0 {
                log::debug!("Dropped {} unsent collapse chunks in {}", dropped, key);
            }
        }

        report.mutations_applied = self.run_due_mutations(world.game_time());
        report
    }

    /// Base definition with this position's overrides layered on top
    pub fn effective_definition(
        &self,
        key: &WorldKey,
        pos: IVec3,
        base: &GrowthBlockDefinition,
    ) -> GrowthBlockDefinition {
        match self
            .worlds
            .get(key)
            .and_then(|slot| slot.growth.get(&pos.to_array()))
        {
            Some(overrides) => overrides.apply(base),
            None => base.clone(),
        }
    }

    pub fn overrides(&self, key: &WorldKey, pos: IVec3) -> Option<&GrowthOverrides> {
        self.worlds.get(key)?.growth.get(&pos.to_array())
    }

    /// Apply a mutation now; returns whether any override changed
    pub fn apply_mutation(
        &mut self,
        key: &WorldKey,
        pos: IVec3,
        mutation: &GrowthMutation,
    ) -> bool {
        let Some(slot) = self.worlds.get_mut(key) else {
            log::warn!("Dropping growth mutation for unknown world {}", key);
            return false;
        };
        let overrides = slot.growth.entry(pos.to_array()).or_default();
        let changed = overrides.apply_mutation(mutation);
        if overrides.is_empty() {
            slot.growth.remove(&pos.to_array());
        }
        if changed {
            slot.dirty = true;
            log::debug!("Growth overrides changed in {} at {}", key, pos);
        }
        changed
    }

    /// Apply a mutation `delay` ticks after `now`
    pub fn schedule_mutation(
        &mut self,
        key: WorldKey,
        pos: IVec3,
        mutation: GrowthMutation,
        now: u64,
        delay: u64,
    ) -> u64 {
        self.scheduler_dirty = true;
        self.mutations.schedule(
            now,
            delay,
            ScheduledMutation {
                world: key,
                pos,
                mutation,
            },
        )
    }

    fn run_due_mutations(&mut self, now: u64) -> usize {
        let due = self.mutations.drain_due(now);
        if due.is_empty() {
            return 0;
        }
        self.scheduler_dirty = true;
        let mut applied = 0;
        for task in due {
            if !self.worlds.contains_key(&task.world) {
                log::warn!(
                    "Dropping scheduled growth mutation at {}: world {} is not loaded",
                    task.pos,
                    task.world
                );
                continue;
            }
            if self.apply_mutation(&task.world, task.pos, &task.mutation) {
                applied += 1;
            }
        }
        applied
    }

    /// Start a growth block's steady pull, if its effective definition pulls
    pub fn spawn_growth_force<W: CollapseWorld>(
        &mut self,
        world: &mut W,
        pos: IVec3,
        base: &GrowthBlockDefinition,
    ) -> Result<Option<FieldId>> {
        let definition = self.effective_definition(world.key(), pos, base);
        let Some(config) = definition.pull_field() else {
            return Ok(None);
        };
        let (radius, strength) = (config.radius, config.strength);
        let duration = i64::from(definition.force_duration_ticks);
        let id = self
            .fields
            .spawn(world, block_center(pos), config, duration)?;
        world.apply_effect(&CollapseEffect::GrowthForce {
            pos,
            radius,
            strength,
        });
        Ok(Some(id))
    }

    /// Light a growth block's fuse: a vortex pull that ends in a push
    pub fn ignite_growth_fuse<W: CollapseWorld>(
        &mut self,
        world: &mut W,
        pos: IVec3,
        base: &GrowthBlockDefinition,
    ) -> Result<Option<FieldId>> {
        let definition = self.effective_definition(world.key(), pos, base);
        let Some(config) = definition.fuse_field() else {
            return Ok(None);
        };
        let fuse_ticks = definition.fuse_ticks.max(1) as u32;
        let id = self
            .fields
            .spawn(world, block_center(pos), config, i64::from(fuse_ticks))?;
        world.apply_effect(&CollapseEffect::GrowthFuse { pos, fuse_ticks });
        Ok(Some(id))
    }

    /// Write every world whose state changed, plus the scheduler if it did
    pub fn save_dirty<S: SaveStore>(&mut self, store: &mut S) -> Result<usize> {
        let mut written = 0;
        for (key, slot) in self.worlds.iter_mut().filter(|(_, s)| s.dirty) {
            store.save(&world_key(key), &slot.to_save())?;
            slot.dirty = false;
            written += 1;
        }
        if self.scheduler_dirty {
            let save = SchedulerSave {
                mutations: self.mutations.clone(),
            };
            store.save(SCHEDULER_KEY, &save)?;
            self.scheduler_dirty = false;
            written += 1;
        }
        Ok(written)
    }

    /// Load a world's saved state, registering it; returns whether a save existed
    pub fn load_world<S: SaveStore>(&mut self, key: &WorldKey, store: &S) -> Result<bool> {
        let save: Option<WorldSave> = store.load(&world_key(key))?;
        let slot = self.worlds.entry(key.clone()).or_default();
        let Some(save) = save else {
            return Ok(false);
        };
        slot.singularity = save
            .singularity
            .as_ref()
            .map(SingularityState::from_record)
            .transpose()?;
        slot.growth = save
            .growth
            .into_iter()
            .map(|entry| (entry.pos, entry.overrides))
            .collect();
        slot.dirty = false;
        log::info!(
            "Loaded {} (singularity: {})",
            key,
            slot.singularity
                .map_or("none".to_string(), |s| s.kind().to_string())
        );
        Ok(true)
    }

    /// Load pending growth mutations
    pub fn load_scheduler<S: SaveStore>(&mut self, store: &S) -> Result<usize> {
        let save: SchedulerSave = store.load(SCHEDULER_KEY)?.unwrap_or_default();
        self.mutations = save.mutations;
        self.scheduler_dirty = false;
        Ok(self.mutations.len())
    }
}

/// Deliver one handler effect
fn route_effect<W: CollapseWorld>(
    world: &mut W,
    broadcast: &mut CollapseBroadcastManager,
    effect: &CollapseEffect,
    report: &mut WorldTickReport,
) {
    match *effect {
        CollapseEffect::PushActors {
            center,
            radius,
            strength,
        } => push_actors(world, block_center(center), radius, strength),
        CollapseEffect::PullActors {
            center,
            ring_radius,
            reach,
            strength,
        } => pull_toward_ring(world, block_center(center), ring_radius, reach, strength),
        CollapseEffect::CarveColumn { x, z, .. } => {
            let chunk = ChunkPos::from_block(x, z);
            if !world.is_chunk_loaded(chunk) {
                log::trace!("Skipping carve at ({}, {}): chunk not loaded", x, z);
                report.columns_skipped += 1;
                return;
            }
            if world.apply_effect(effect) {
                broadcast.queue(chunk);
                report.effects_applied += 1;
            }
        }
        CollapseEffect::DeployBorder { center, radius } => {
            broadcast.deploy_border(world, center, radius);
        }
        CollapseEffect::SyncBorder { center } => broadcast.sync_border(world, center),
        _ => {
            if world.apply_effect(effect) {
                report.effects_applied += 1;
            }
        }
    }
}

/// Detonation shove, strongest at the center
fn push_actors<W: ActorWorld>(world: &mut W, center: Vec3, radius: f32, strength: f32) {
    let Ok(zone) = ForceZone::new(radius, strength, FalloffCurve::Linear) else {
        log::warn!("Skipping push with radius {} strength {}", radius, strength);
        return;
    };
    for actor in world.actors_within(center, radius) {
        if !actor.is_alive() || actor.is_spectator() {
            continue;
        }
        let impulse = zone.impulse(center, actor.position(), 1.0);
        actor.set_velocity(actor.velocity() + impulse);
    }
}

/// Horizontal pull toward the center for actors near the ring front
fn pull_toward_ring<W: ActorWorld>(
    world: &mut W,
    center: Vec3,
    ring_radius: f32,
    reach: f32,
    strength: f32,
) {
    let Ok(zone) = ForceZone::new(reach, strength, FalloffCurve::Smooth) else {
        return;
    };
    let inner = (ring_radius - RING_PULL_BAND).max(0.0);
    for actor in world.actors_within(center, ring_radius + reach) {
        if !actor.is_alive() || actor.is_spectator() {
            continue;
        }
        let mut offset = actor.position() - center;
        offset.y = 0.0;
        let distance = horizontal_length(offset);
        if distance < inner {
            continue;
        }
        let magnitude = zone.strength_at((distance - ring_radius).abs());
        if magnitude <= 0.0 {
            continue;
        }
        let inward = -offset.normalize_or_zero() * magnitude;
        actor.set_velocity(actor.velocity() + inward);
        actor.reset_fall_distance();
    }
}

/// Per-world RNG seed, stable across restarts
fn world_seed(seed: u64, key: &WorldKey) -> u64 {
    // FNV-1a over the key
    key.as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64 ^ seed, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
}
