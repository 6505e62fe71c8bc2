//! Dimension profiles
//!
//! Tuning for the collapse phase machine, loaded per world and hot-reloadable.
//! The phase machine reads the current profile on every tick and never caches
//! values across ticks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::WorldKey;
use crate::error::{CollapseError, Result};

/// How collapse chunk updates reach connected clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BroadcastMode {
    /// Flush every buffered chunk on every tick
    Immediate,
    /// Flush periodically, only near viewers
    #[default]
    Delayed,
    /// Like `Delayed`, plus a log line with flushed/pending counts
    Summary,
}

impl BroadcastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastMode::Immediate => "Immediate",
            BroadcastMode::Delayed => "Delayed",
            BroadcastMode::Summary => "Summary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "immediate" => Some(BroadcastMode::Immediate),
            "delayed" | "delay" => Some(BroadcastMode::Delayed),
            "summary" => Some(BroadcastMode::Summary),
            _ => None,
        }
    }
}

/// Per-dimension collapse tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionProfile {
    // === Ring ===
    /// Ticks between ring column batches
    pub collapse_tick_interval: u32,
    /// Columns carved per ring tick
    pub columns_per_tick: u32,
    /// Random radial jitter applied to carved columns (blocks)
    pub ring_jitter: f32,
    /// Radius around the ring band where actors are pulled inward
    pub ring_pull_radius: f32,
    /// Inward pull strength at the ring band
    pub ring_pull_strength: f32,

    // === Core ===
    /// Charging countdown before detonation
    pub core_charge_ticks: u32,
    /// Radius of the detonation push
    pub push_radius: f32,
    /// Strength of the detonation push at the center
    pub push_strength: f32,
    /// Detonation power handed to the world's explosion effect
    pub detonation_power: f32,

    // === Fuse ===
    /// Ticks of fusing before the core forms
    pub fuse_delay_ticks: u32,
    /// Fuse elapsed ticks after which the shell collapses
    pub fuse_collapse_ticks: u32,
    /// Ticks between fuse pulses
    pub fuse_pulse_interval_ticks: u32,

    // === Aftermath ===
    /// Dissipation countdown before reset or finish
    pub reset_delay_ticks: u32,

    // === Broadcast ===
    pub broadcast_mode: BroadcastMode,
    /// Radius around viewers within which delayed chunks are flushed (<= 0: all)
    pub broadcast_radius: f32,
    /// Ticks between delayed flushes
    pub broadcast_interval_ticks: u32,
}

impl Default for DimensionProfile {
    fn default() -> Self {
        Self {
            collapse_tick_interval: 20,
            columns_per_tick: 8,
            ring_jitter: 1.5,
            ring_pull_radius: 24.0,
            ring_pull_strength: 0.6,

            core_charge_ticks: 100,
            push_radius: 32.0,
            push_strength: 2.5,
            detonation_power: 12.0,

            fuse_delay_ticks: 400,
            fuse_collapse_ticks: 300,
            fuse_pulse_interval_ticks: 20,

            reset_delay_ticks: 200,

            broadcast_mode: BroadcastMode::Delayed,
            broadcast_radius: 128.0,
            broadcast_interval_ticks: 20,
        }
    }
}

impl DimensionProfile {
    /// Ticks the ring persists once carving begins
    pub fn ring_duration_ticks(&self) -> u32 {
        self.collapse_tick_interval
            .saturating_mul(self.columns_per_tick)
    }

    /// Parse and validate a profile from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject values the phase machine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.broadcast_interval_ticks == 0 {
            return Err(CollapseError::invalid(
                "broadcast_interval_ticks must be at least 1",
            ));
        }
        let non_negative = [
            ("ring_jitter", self.ring_jitter),
            ("ring_pull_radius", self.ring_pull_radius),
            ("ring_pull_strength", self.ring_pull_strength),
            ("push_radius", self.push_radius),
            ("push_strength", self.push_strength),
            ("detonation_power", self.detonation_power),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CollapseError::invalid(format!(
                    "{name} must be finite and not negative, got {value}"
                )));
            }
        }
        // <= 0 means "flush everywhere", so only finiteness matters here
        if !self.broadcast_radius.is_finite() {
            return Err(CollapseError::invalid(format!(
                "broadcast_radius must be finite, got {}",
                self.broadcast_radius
            )));
        }
        Ok(())
    }
}

/// Profiles keyed by world, replaceable at runtime
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    default: DimensionProfile,
    by_world: HashMap<WorldKey, DimensionProfile>,
}

impl ProfileRegistry {
    pub fn new(default: DimensionProfile) -> Self {
        Self {
            default,
            by_world: HashMap::new(),
        }
    }

    /// Install or hot-swap the profile for a world
    pub fn replace(&mut self, world: WorldKey, profile: DimensionProfile) -> Result<()> {
        profile.validate()?;
        log::info!("Profile updated for {}", world);
        self.by_world.insert(world, profile);
        Ok(())
    }

    /// Current profile for a world (falls back to the default)
    pub fn get(&self, world: &WorldKey) -> &DimensionProfile {
        self.by_world.get(world).unwrap_or(&self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_mode_from_str() {
        assert_eq!(BroadcastMode::from_str("SUMMARY"), Some(BroadcastMode::Summary));
        assert_eq!(BroadcastMode::from_str("delay"), Some(BroadcastMode::Delayed));
        assert_eq!(BroadcastMode::from_str("loud"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "columns_per_tick": 3, "broadcast_mode": "Summary" }"#;
        let profile = DimensionProfile::from_json_str(json).unwrap();
        assert_eq!(profile.columns_per_tick, 3);
        assert_eq!(profile.broadcast_mode, BroadcastMode::Summary);
        assert_eq!(profile.fuse_delay_ticks, DimensionProfile::default().fuse_delay_ticks);
        assert_eq!(profile.ring_duration_ticks(), 60);
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let err = DimensionProfile::from_json_str(r#"{ "broadcast_interval_ticks": 0 }"#);
        assert!(matches!(err, Err(CollapseError::InvalidArgument { .. })));

        let mut registry = ProfileRegistry::default();
        let bad = DimensionProfile {
            push_radius: -1.0,
            ..Default::default()
        };
        assert!(registry.replace(WorldKey::new("overworld"), bad).is_err());
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        // 1e39 overflows f32 and parses as infinity
        let err = DimensionProfile::from_json_str(r#"{ "ring_jitter": 1e39 }"#);
        assert!(matches!(err, Err(CollapseError::InvalidArgument { .. })));

        for profile in [
            DimensionProfile {
                push_strength: f32::NAN,
                ..Default::default()
            },
            DimensionProfile {
                detonation_power: f32::INFINITY,
                ..Default::default()
            },
            DimensionProfile {
                broadcast_radius: f32::NEG_INFINITY,
                ..Default::default()
            },
        ] {
            assert!(profile.validate().is_err(), "{profile:?} should be rejected");
        }

        let flush_everywhere = DimensionProfile {
            broadcast_radius: -1.0,
            ..Default::default()
        };
        assert!(flush_everywhere.validate().is_ok());
    }

    #[test]
    fn test_registry_hot_reload() {
        let mut registry = ProfileRegistry::default();
        let world = WorldKey::new("overworld");
        assert_eq!(registry.get(&world).columns_per_tick, 8);

        let profile = DimensionProfile {
            columns_per_tick: 2,
            ..Default::default()
        };
        registry.replace(world.clone(), profile).unwrap();
        assert_eq!(registry.get(&world).columns_per_tick, 2);
        assert_eq!(registry.get(&WorldKey::new("nether")).columns_per_tick, 8);
    }
}
