//! Side effects requested by the phase machine
//!
//! Handlers never touch the world. They return a list of `CollapseEffect`s
//! which the orchestrator routes to actors, the broadcast manager or the
//! host's [`EffectSink`].

use glam::IVec3;
use serde::{Deserialize, Serialize};

/// A fire-and-forget request produced by a phase handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CollapseEffect {
    /// Fuse visuals/audio for this tick
    FuseTick {
        center: IVec3,
        elapsed: u32,
        remaining: u32,
    },
    /// Periodic fuse pulse
    FusePulse { center: IVec3, elapsed: u32 },
    /// Keep fuse helper entities alive and positioned
    MaintainFuseEntities { center: IVec3 },
    /// One-shot collapse of the infection shell
    ShellCollapse { center: IVec3 },
    /// Remove fuse helper entities
    ClearFuseEntities { center: IVec3 },
    /// Core charging countdown
    ChargeTick { center: IVec3, remaining: u32 },
    /// Shove actors away from the center
    PushActors {
        center: IVec3,
        radius: f32,
        strength: f32,
    },
    /// Explosion at the core
    Detonation { center: IVec3, power: f32 },
    /// Raise the collapse border
    DeployBorder { center: IVec3, radius: f32 },
    /// Ring front visual
    RingPulse { center: IVec3, radius: f32 },
    /// Carve one terrain column
    CarveColumn { x: i32, z: i32, top_down: bool },
    /// Drag actors near the ring band inward
    PullActors {
        center: IVec3,
        ring_radius: f32,
        reach: f32,
        strength: f32,
    },
    /// Bring clients' border view up to date
    SyncBorder { center: IVec3 },
    /// Aftermath visuals
    DissipationTick { center: IVec3, remaining: u32 },
    /// Run one step of the host's post-collapse reset
    ProcessReset,
    /// A growth block started pulling
    GrowthForce {
        pos: IVec3,
        radius: f32,
        strength: f32,
    },
    /// A growth block's fuse was lit
    GrowthFuse { pos: IVec3, fuse_ticks: u32 },
}

impl CollapseEffect {
    /// Event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            CollapseEffect::FuseTick { .. } => "fuse-tick",
            CollapseEffect::FusePulse { .. } => "fuse-pulse",
            CollapseEffect::MaintainFuseEntities { .. } => "maintain-fuse-entities",
            CollapseEffect::ShellCollapse { .. } => "shell-collapse",
            CollapseEffect::ClearFuseEntities { .. } => "clear-fuse-entities",
            CollapseEffect::ChargeTick { .. } => "charge-tick",
            CollapseEffect::PushActors { .. } => "push-actors",
            CollapseEffect::Detonation { .. } => "detonation",
            CollapseEffect::DeployBorder { .. } => "deploy-border",
            CollapseEffect::RingPulse { .. } => "ring-pulse",
            CollapseEffect::CarveColumn { .. } => "carve-column",
            CollapseEffect::PullActors { .. } => "pull-actors",
            CollapseEffect::SyncBorder { .. } => "sync-border",
            CollapseEffect::DissipationTick { .. } => "dissipation-tick",
            CollapseEffect::ProcessReset => "process-reset",
            CollapseEffect::GrowthForce { .. } => "growth-force",
            CollapseEffect::GrowthFuse { .. } => "growth-fuse",
        }
    }
}

/// Receives effects the simulation cannot perform itself
pub trait EffectSink {
    /// Perform an effect; return false if it could not run this tick
    fn apply_effect(&mut self, effect: &CollapseEffect) -> bool;
}
