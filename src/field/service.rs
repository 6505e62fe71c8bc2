//! Force field registry and per-tick application
//!
//! Fields are keyed by [`FieldId`] and iterated in id order so ticking is
//! deterministic. Each field belongs to exactly one world and is only touched
//! while that world ticks.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::phase::{ForcePhase, ForcePolarity, PhaseNotification, phase_at, phase_index_at};
use super::radial::{ForceContext, ForceFieldConfig, RadialForceField};
use crate::error::Result;
use crate::sim::world::{ActorWorld, ForceTarget};
use crate::{WorldKey, horizontal_length};

/// Opaque field handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(u64);

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

/// A spawned field
#[derive(Debug, Clone)]
pub struct ActiveForceField {
    pub id: FieldId,
    pub world: WorldKey,
    pub center: Vec3,
    pub config: ForceFieldConfig,
    pub spawn_tick: u64,
    /// Lifetime in ticks, negative for infinite
    pub duration_ticks: i64,
    /// Index of the last resolved phase
    current_phase: Option<usize>,
    phase_started_tick: u64,
    notified: bool,
}

impl ActiveForceField {
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.spawn_tick)
    }

    pub fn is_infinite(&self) -> bool {
        self.duration_ticks < 0
    }

    pub fn is_expired(&self, now: u64) -> bool {
        !self.is_infinite() && self.elapsed(now) >= self.duration_ticks as u64
    }

    /// Fraction of lifetime used, in [0, 1]; infinite fields stay at 0
    pub fn normalized_time(&self, now: u64) -> f32 {
        if self.is_infinite() {
            return 0.0;
        }
        if self.duration_ticks == 0 {
            return 1.0;
        }
        (self.elapsed(now) as f32 / self.duration_ticks as f32).min(1.0)
    }

    pub fn current_phase(&self) -> Option<&ForcePhase> {
        self.current_phase.and_then(|i| self.config.phases.get(i))
    }
}

/// Something a host may want to surface after a field tick
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    PhaseChanged {
        id: FieldId,
        from: Option<ForcePolarity>,
        to: Option<ForcePolarity>,
    },
    Notification {
        id: FieldId,
        center: Vec3,
        notification: PhaseNotification,
    },
    Expired {
        id: FieldId,
        /// Whether a final push was applied on the expiry tick
        release_burst: bool,
    },
}

/// Registry of active fields
#[derive(Debug, Default)]
pub struct ForceFieldService {
    fields: BTreeMap<FieldId, ActiveForceField>,
    next_id: u64,
}

impl ForceFieldService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field centered at `center`; negative `duration_ticks` never expires
    pub fn spawn<W: ActorWorld>(
        &mut self,
        world: &W,
        center: Vec3,
        config: ForceFieldConfig,
        duration_ticks: i64,
    ) -> Result<FieldId> {
        config.validate()?;
        self.next_id += 1;
        let id = FieldId(self.next_id);
        let spawn_tick = world.game_time();
        log::debug!(
            "Spawned {} in {} at {:?} (radius {}, duration {})",
            id,
            world.key(),
            center,
            config.radius,
            duration_ticks
        );
        self.fields.insert(
            id,
            ActiveForceField {
                id,
                world: world.key().clone(),
                center,
                config,
                spawn_tick,
                duration_ticks,
                current_phase: None,
                phase_started_tick: spawn_tick,
                notified: false,
            },
        );
        Ok(id)
    }

    /// Remove a field; unknown ids are ignored
    pub fn remove(&mut self, id: FieldId) -> bool {
        self.fields.remove(&id).is_some()
    }

    /// Remove every field in a world, returning how many were removed
    pub fn remove_all(&mut self, world: &WorldKey) -> usize {
        let before = self.fields.len();
        self.fields.retain(|_, field| &field.world != world);
        before - self.fields.len()
    }

    pub fn get(&self, id: FieldId) -> Option<&ActiveForceField> {
        self.fields.get(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn count_in(&self, world: &WorldKey) -> usize {
        self.fields.values().filter(|f| &f.world == world).count()
    }

    /// Advance every field registered to `world` by one tick
    pub fn tick<W: ActorWorld>(&mut self, world: &mut W) -> Vec<FieldEvent> {
        let now = world.game_time();
        let ids: Vec<FieldId> = self
            .fields
            .values()
            .filter(|f| &f.world == world.key())
            .map(|f| f.id)
            .collect();

        let mut events = Vec::new();
        for id in ids {
            let Some(field) = self.fields.get_mut(&id) else {
                continue;
            };

            if field.is_expired(now) {
                let burst = phase_at(&field.config.phases, 1.0)
                    .filter(|p| p.polarity() == ForcePolarity::Push)
                    .cloned();
                if let Some(phase) = &burst {
                    let pushed = apply_forces(world, field, phase, now);
                    log::debug!("{} release burst pushed {} actors", id, pushed);
                }
                events.push(FieldEvent::Expired {
                    id,
                    release_burst: burst.is_some(),
                });
                self.fields.remove(&id);
                continue;
            }

            let t = field.normalized_time(now);
            let index = phase_index_at(&field.config.phases, t);
            if index != field.current_phase {
                let from = field.current_phase().map(|p| p.polarity());
                field.current_phase = index;
                field.phase_started_tick = now;
                field.notified = false;
                let to = field.current_phase().map(|p| p.polarity());
                log::debug!("{} phase {:?} -> {:?}", id, from, to);
                events.push(FieldEvent::PhaseChanged { id, from, to });
            }

            let phase = match index {
                Some(i) => field.config.phases[i].clone(),
                // No phases configured: plain pull for the whole lifetime
                None if field.config.phases.is_empty() => ForcePhase::full(ForcePolarity::Pull),
                // Gap between windows: inert this tick
                None => continue,
            };

            if !field.notified {
                if let Some(notification) = phase.notification() {
                    let since_start = now.saturating_sub(field.phase_started_tick);
                    if since_start >= u64::from(notification.tick_offset) {
                        field.notified = true;
                        events.push(FieldEvent::Notification {
                            id,
                            center: field.center,
                            notification: notification.clone(),
                        });
                    }
                }
            }

            apply_forces(world, field, &phase, now);
        }
        events
    }
}

/// Apply one tick of a field's force to every eligible actor in range
///
/// Returns how many actors had their velocity changed.
fn apply_forces<W: ActorWorld>(
    world: &mut W,
    field: &ActiveForceField,
    phase: &ForcePhase,
    now: u64,
) -> usize {
    let scale = phase.force_scale();
    if scale == 0.0 {
        return 0;
    }
    let config = &field.config;
    let ticks_elapsed = field.elapsed(now);
    let mut applied = 0;

    for actor in world.actors_within(field.center, config.radius) {
        if !actor.is_alive() || actor.is_spectator() {
            continue;
        }
        let ctx = ForceContext::new(
            field.center,
            actor.position(),
            actor.velocity(),
            actor.on_ground(),
            ticks_elapsed,
        );
        let force = RadialForceField::calculate_force(&ctx, config, scale);
        if force.length_squared() == 0.0 {
            continue;
        }

        let mut velocity = actor.velocity() * (1.0 - config.damping) + force;
        let horizontal = horizontal_length(velocity);
        if horizontal > config.max_velocity {
            let k = config.max_velocity / horizontal;
            velocity.x *= k;
            velocity.z *= k;
        }
        velocity.y = velocity.y.clamp(-config.max_velocity, config.max_velocity);

        actor.set_velocity(velocity);
        actor.reset_fall_distance();
        applied += 1;
    }
    applied
}
