//! Radial gravity-like force
//!
//! Stateless: given where an actor is relative to a field center and how it
//! is moving, produce the velocity delta for this tick. The active phase's
//! signed scale flips and weights everything except ground lift, which always
//! points up.
//!
//! Beyond the radial pull the field adds two small perpendicular nudges so
//! orbits precess instead of settling into one plane, and so actors do not
//! thread the exact center on the same line every pass.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::falloff::FalloffCurve;
use super::phase::ForcePhase;
use crate::error::{CollapseError, Result};

/// How the radial magnitude decays with distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GravityModel {
    Constant,
    Linear,
    Quadratic,
    /// Softened inverse-square, strongest near the center
    #[default]
    InverseSquare,
}

/// Whether an orbit axis drifts over time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum OrbitMode {
    #[default]
    Fixed,
    /// Oscillate at `rate` radians per tick
    Evolving { rate: f32 },
}

impl OrbitMode {
    fn rate(&self) -> Option<f32> {
        match *self {
            OrbitMode::Fixed => None,
            OrbitMode::Evolving { rate } if rate != 0.0 => Some(rate),
            OrbitMode::Evolving { .. } => None,
        }
    }
}

/// Tuned game-feel constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceTuning {
    /// Minimum magnitude as a fraction of strength
    pub floor: f32,
    /// Maximum magnitude as a fraction of strength
    pub ceiling: f32,
    /// Inverse-square softening before strength scaling
    pub base_softening: f32,
    /// Softening growth per unit of strength
    pub softening_strength_scale: f32,
    /// Share of gravity used by orbit nudges
    pub orbit_gravity_share: f32,
    /// Center perturbation strength as a fraction of strength
    pub perturbation_strength: f32,
    /// Normalized distance under which center perturbation applies
    pub perturbation_zone: f32,
    /// Speed an actor needs before center perturbation kicks in
    pub perturbation_min_speed: f32,
}

impl Default for ForceTuning {
    fn default() -> Self {
        Self {
            floor: 0.12,
            ceiling: 4.0,
            base_softening: 0.05,
            softening_strength_scale: 0.5,
            orbit_gravity_share: 0.25,
            perturbation_strength: 0.08,
            perturbation_zone: 0.15,
            perturbation_min_speed: 0.05,
        }
    }
}

/// Static description of a force field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceFieldConfig {
    pub radius: f32,
    pub strength: f32,
    pub gravity: GravityModel,
    /// Fraction of existing velocity removed each tick (0..1)
    pub damping: f32,
    /// Horizontal speed cap and vertical speed bound
    pub max_velocity: f32,
    /// Upward push for grounded actors (0 disables)
    pub ground_lift: f32,
    pub tilt: OrbitMode,
    pub orientation: OrbitMode,
    /// Scale of the orbit nudges
    pub orbit_amplitude: f32,
    pub phases: Vec<ForcePhase>,
    pub tuning: ForceTuning,
}

impl Default for ForceFieldConfig {
    fn default() -> Self {
        Self {
            radius: 16.0,
            strength: 0.1,
            gravity: GravityModel::InverseSquare,
            damping: 0.05,
            max_velocity: 1.5,
            ground_lift: 0.0,
            tilt: OrbitMode::Fixed,
            orientation: OrbitMode::Fixed,
            orbit_amplitude: 1.0,
            phases: Vec::new(),
            tuning: ForceTuning::default(),
        }
    }
}

impl ForceFieldConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(CollapseError::invalid(format!(
                "field radius must be positive, got {}",
                self.radius
            )));
        }
        if !self.strength.is_finite() || self.strength < 0.0 {
            return Err(CollapseError::invalid(format!(
                "field strength must not be negative, got {}",
                self.strength
            )));
        }
        if !(0.0..1.0).contains(&self.damping) {
            return Err(CollapseError::invalid(format!(
                "damping must be in [0, 1), got {}",
                self.damping
            )));
        }
        if !self.max_velocity.is_finite() || self.max_velocity <= 0.0 {
            return Err(CollapseError::invalid("max_velocity must be positive"));
        }
        if self.tuning.floor > self.tuning.ceiling {
            return Err(CollapseError::invalid("force floor exceeds ceiling"));
        }
        Ok(())
    }
}

/// Per-actor inputs for one force evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceContext {
    pub distance: f32,
    /// Unit vector from the actor toward the center
    pub direction_to_center: Vec3,
    pub velocity: Vec3,
    pub on_ground: bool,
    pub ticks_elapsed: u64,
}

impl ForceContext {
    /// Build a context for an actor at `position`
    pub fn new(
        center: Vec3,
        position: Vec3,
        velocity: Vec3,
        on_ground: bool,
        ticks_elapsed: u64,
    ) -> Self {
        let offset = center - position;
        Self {
            distance: offset.length(),
            direction_to_center: offset.normalize_or_zero(),
            velocity,
            on_ground,
            ticks_elapsed,
        }
    }
}

/// Stateless radial force model
pub struct RadialForceField;

impl RadialForceField {
    /// Clamped radial magnitude at `distance`, 0 when outside or disabled
    pub fn gravity_magnitude(distance: f32, config: &ForceFieldConfig) -> f32 {
        let radius = config.radius;
        let strength = config.strength;
        if radius <= 0.0 || strength <= 0.0 || distance > radius {
            return 0.0;
        }
        let tuning = &config.tuning;
        let normalized = (distance / radius).clamp(0.0, 1.0);

        let raw = match config.gravity {
            GravityModel::Constant => strength,
            GravityModel::Linear => FalloffCurve::Linear.strength_at(strength, distance, radius),
            GravityModel::Quadratic => {
                FalloffCurve::Quadratic.strength_at(strength, distance, radius)
            }
            GravityModel::InverseSquare => {
                let softening =
                    tuning.base_softening * (1.0 + strength * tuning.softening_strength_scale);
                strength / (normalized * normalized + softening.max(f32::EPSILON))
            }
        };

        let floor = strength * tuning.floor;
        let ceiling = strength * tuning.ceiling;
        raw.max(floor).min(ceiling)
    }

    /// Velocity delta for one actor this tick
    ///
    /// `scale` is the phase's signed force scale (negative pushes outward).
    pub fn calculate_force(ctx: &ForceContext, config: &ForceFieldConfig, scale: f32) -> Vec3 {
        if config.radius <= 0.0 || ctx.distance > config.radius {
            return Vec3::ZERO;
        }
        let gravity = Self::gravity_magnitude(ctx.distance, config);
        if gravity <= 0.0 {
            return Vec3::ZERO;
        }
        let tuning = &config.tuning;
        let dir = ctx.direction_to_center;
        let mut force = dir * gravity;

        let time = ctx.ticks_elapsed as f32;
        let nudge = gravity * tuning.orbit_gravity_share * config.orbit_amplitude;
        if let Some(rate) = config.tilt.rate() {
            let axis = dir.cross(Vec3::X).normalize_or_zero();
            force += axis * (time * rate).sin() * nudge;
        }
        if let Some(rate) = config.orientation.rate() {
            let axis = dir.cross(Vec3::Z).normalize_or_zero();
            force += axis * (time * rate).sin() * nudge;
        }

        let normalized = ctx.distance / config.radius;
        let speed = ctx.velocity.length();
        if tuning.perturbation_zone > 0.0
            && normalized < tuning.perturbation_zone
            && speed > tuning.perturbation_min_speed
        {
            let mut side = ctx.velocity.cross(Vec3::Y);
            if side.length_squared() < 1e-8 {
                side = ctx.velocity.cross(Vec3::X);
            }
            let nudge_scale = config.strength
                * tuning.perturbation_strength
                * (1.0 - normalized / tuning.perturbation_zone);
            force += side.normalize_or_zero() * nudge_scale;
        }

        force *= scale;
        if config.ground_lift > 0.0 && ctx.on_ground {
            force.y += config.ground_lift;
        }

        force
    }
}
