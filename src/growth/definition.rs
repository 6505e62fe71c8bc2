//! Growth block definitions
//!
//! Immutable configuration records. Per-position overrides never modify a
//! definition; they produce a new one.

use serde::{Deserialize, Serialize};

use super::field::{
    BoolField, DoubleField, FieldValue, GrowthField, Identifier, IdentifierField, IntField,
};
use crate::field::{
    FalloffCurve, ForceFieldConfig, ForcePhase, ForcePolarity, ForceZone, GravityModel,
    OrbitMode, PhaseNotification, Severity,
};

/// Growth block configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthBlockDefinition {
    pub id: Identifier,
    pub growth_enabled: bool,
    pub has_collision: bool,
    pub does_destruction: bool,
    pub has_fuse: bool,
    pub touch_to_unfuse: bool,
    pub pulling: bool,
    pub pushing: bool,
    pub rate_ticks: i32,
    pub fuse_ticks: i32,
    pub force_duration_ticks: i32,
    pub rate_scale: f64,
    pub start_scale: f64,
    pub max_scale: f64,
    pub hitbox_scale: f64,
    pub pulling_force: f64,
    pub pushing_force: f64,
    pub force_radius: f64,
    pub growth_block: Identifier,
    pub particle_effect: Identifier,
    pub sound_effect: Identifier,
    pub fuse_particle: Identifier,
}

impl GrowthBlockDefinition {
    /// Baseline definition for a new growth block id
    pub fn new(id: Identifier) -> Self {
        let ident = |raw: &str| Identifier::parse(raw).unwrap_or_else(|_| id.clone());
        Self {
            growth_block: ident("minecraft:obsidian"),
            particle_effect: ident("minecraft:portal"),
            sound_effect: ident("minecraft:block.respawn_anchor.charge"),
            fuse_particle: ident("minecraft:flame"),
            id,
            growth_enabled: true,
            has_collision: true,
            does_destruction: false,
            has_fuse: false,
            touch_to_unfuse: false,
            pulling: false,
            pushing: false,
            rate_ticks: 20,
            fuse_ticks: 80,
            force_duration_ticks: 200,
            rate_scale: 1.1,
            start_scale: 1.0,
            max_scale: 8.0,
            hitbox_scale: 1.0,
            pulling_force: 0.15,
            pushing_force: 0.4,
            force_radius: 12.0,
        }
    }

    /// Current value of a field
    pub fn get(&self, field: GrowthField) -> FieldValue {
        match field {
            GrowthField::Bool(f) => FieldValue::Bool(match f {
                BoolField::GrowthEnabled => self.growth_enabled,
                BoolField::HasCollision => self.has_collision,
                BoolField::DoesDestruction => self.does_destruction,
                BoolField::HasFuse => self.has_fuse,
                BoolField::TouchToUnfuse => self.touch_to_unfuse,
                BoolField::Pulling => self.pulling,
                BoolField::Pushing => self.pushing,
            }),
            GrowthField::Int(f) => FieldValue::Int(match f {
                IntField::RateTicks => self.rate_ticks,
                IntField::FuseTicks => self.fuse_ticks,
                IntField::ForceDurationTicks => self.force_duration_ticks,
            }),
            GrowthField::Double(f) => FieldValue::Double(match f {
                DoubleField::RateScale => self.rate_scale,
                DoubleField::StartScale => self.start_scale,
                DoubleField::MaxScale => self.max_scale,
                DoubleField::HitboxScale => self.hitbox_scale,
                DoubleField::PullingForce => self.pulling_force,
                DoubleField::PushingForce => self.pushing_force,
                DoubleField::ForceRadius => self.force_radius,
            }),
            GrowthField::Identifier(f) => FieldValue::Identifier(match f {
                IdentifierField::GrowthBlock => self.growth_block.clone(),
                IdentifierField::ParticleEffect => self.particle_effect.clone(),
                IdentifierField::SoundEffect => self.sound_effect.clone(),
                IdentifierField::FuseParticle => self.fuse_particle.clone(),
            }),
        }
    }

    /// Write a value already checked against the field's type
    pub(crate) fn set(&mut self, field: GrowthField, value: &FieldValue) {
        match (field, value) {
            (GrowthField::Bool(f), FieldValue::Bool(v)) => {
                let slot = match f {
                    BoolField::GrowthEnabled => &mut self.growth_enabled,
                    BoolField::HasCollision => &mut self.has_collision,
                    BoolField::DoesDestruction => &mut self.does_destruction,
                    BoolField::HasFuse => &mut self.has_fuse,
                    BoolField::TouchToUnfuse => &mut self.touch_to_unfuse,
                    BoolField::Pulling => &mut self.pulling,
                    BoolField::Pushing => &mut self.pushing,
                };
                *slot = *v;
            }
            (GrowthField::Int(f), FieldValue::Int(v)) => {
                let slot = match f {
                    IntField::RateTicks => &mut self.rate_ticks,
                    IntField::FuseTicks => &mut self.fuse_ticks,
                    IntField::ForceDurationTicks => &mut self.force_duration_ticks,
                };
                *slot = *v;
            }
            (GrowthField::Double(f), FieldValue::Double(v)) => {
                let slot = match f {
                    DoubleField::RateScale => &mut self.rate_scale,
                    DoubleField::StartScale => &mut self.start_scale,
                    DoubleField::MaxScale => &mut self.max_scale,
                    DoubleField::HitboxScale => &mut self.hitbox_scale,
                    DoubleField::PullingForce => &mut self.pulling_force,
                    DoubleField::PushingForce => &mut self.pushing_force,
                    DoubleField::ForceRadius => &mut self.force_radius,
                };
                *slot = *v;
            }
            (GrowthField::Identifier(f), FieldValue::Identifier(v)) => {
                let slot = match f {
                    IdentifierField::GrowthBlock => &mut self.growth_block,
                    IdentifierField::ParticleEffect => &mut self.particle_effect,
                    IdentifierField::SoundEffect => &mut self.sound_effect,
                    IdentifierField::FuseParticle => &mut self.fuse_particle,
                };
                *slot = v.clone();
            }
            (field, value) => {
                log::warn!(
                    "Ignoring {} value for {} field {}",
                    value.type_name(),
                    field.type_name(),
                    field
                );
            }
        }
    }

    /// Pull zone around the block, if it pulls at all
    pub fn pull_zone(&self) -> Option<ForceZone> {
        if !self.pulling || self.pulling_force <= 0.0 {
            return None;
        }
        ForceZone::new(
            self.force_radius as f32,
            self.pulling_force as f32,
            FalloffCurve::Linear,
        )
        .ok()
    }

    /// Steady pull field for a growing block
    pub fn pull_field(&self) -> Option<ForceFieldConfig> {
        let zone = self.pull_zone()?;
        Some(ForceFieldConfig {
            radius: zone.radius(),
            strength: zone.strength(),
            gravity: GravityModel::Linear,
            ground_lift: 0.05,
            tilt: OrbitMode::Evolving { rate: 0.05 },
            phases: vec![ForcePhase::full(ForcePolarity::Pull)],
            ..Default::default()
        })
    }

    /// Vortex pull that ends in a shockwave push, for a lit fuse
    pub fn fuse_field(&self) -> Option<ForceFieldConfig> {
        if !self.has_fuse || self.force_radius <= 0.0 {
            return None;
        }
        let pull = self.pulling_force.max(0.01) as f32;
        let push = (self.pushing_force.max(0.01) / self.pulling_force.max(0.01)) as f32;
        let phases = vec![
            ForcePhase::new(0.0, 80.0, ForcePolarity::Pull, 1.0).ok()?,
            ForcePhase::new(80.0, 100.0, ForcePolarity::Push, push)
                .ok()?
                .with_notification(PhaseNotification {
                    message: "The growth is about to burst!".to_string(),
                    tick_offset: 0,
                    severity: Severity::Danger,
                }),
        ];
        Some(ForceFieldConfig {
            radius: self.force_radius as f32,
            strength: pull,
            gravity: GravityModel::InverseSquare,
            tilt: OrbitMode::Evolving { rate: 0.08 },
            orientation: OrbitMode::Evolving { rate: 0.05 },
            phases,
            ..Default::default()
        })
    }
}
