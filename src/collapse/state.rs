//! Singularity phase state
//!
//! One `SingularityState` exists per world once that world has seen its first
//! infection event. Each phase carries only the counters it needs; the center
//! is shared across phases and is cleared when a cycle finishes.

use glam::IVec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, Result};

/// Phase discriminant, stable across saves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Dormant,
    Fusing,
    Core,
    Ring,
    Dissipation,
    Reset,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 6] = [
        PhaseKind::Dormant,
        PhaseKind::Fusing,
        PhaseKind::Core,
        PhaseKind::Ring,
        PhaseKind::Dissipation,
        PhaseKind::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Dormant => "DORMANT",
            PhaseKind::Fusing => "FUSING",
            PhaseKind::Core => "CORE",
            PhaseKind::Ring => "RING",
            PhaseKind::Dissipation => "DISSIPATION",
            PhaseKind::Reset => "RESET",
        }
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase and its counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SingularityPhase {
    /// Waiting for the infection to die out near the final wave
    Dormant,
    /// Fuse burning down toward core formation
    Fusing {
        fuse_ticks_remaining: u32,
        fuse_elapsed: u32,
        shell_collapsed: bool,
    },
    /// Charging; detonates when `phase_delay` reaches 0
    Core { phase_delay: u32 },
    /// Expanding ring carving columns outward
    Ring {
        phase_delay: u32,
        ring_ticks_remaining: u32,
        ring_elapsed: u32,
    },
    /// Aftermath countdown
    Dissipation { phase_delay: u32 },
    /// Post-collapse reset owned by the host
    Reset,
}

impl SingularityPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            SingularityPhase::Dormant => PhaseKind::Dormant,
            SingularityPhase::Fusing { .. } => PhaseKind::Fusing,
            SingularityPhase::Core { .. } => PhaseKind::Core,
            SingularityPhase::Ring { .. } => PhaseKind::Ring,
            SingularityPhase::Dissipation { .. } => PhaseKind::Dissipation,
            SingularityPhase::Reset => PhaseKind::Reset,
        }
    }

    /// Gate countdown, for phases that have one
    pub fn phase_delay(&self) -> Option<u32> {
        match *self {
            SingularityPhase::Core { phase_delay }
            | SingularityPhase::Ring { phase_delay, .. }
            | SingularityPhase::Dissipation { phase_delay } => Some(phase_delay),
            _ => None,
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Generator for the next batch of draws; advances the stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream);
        self.stream = self.stream.wrapping_add(1);
        rng
    }
}

/// Per-world singularity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingularityState {
    pub center: Option<IVec3>,
    pub phase: SingularityPhase,
    pub rng: RngState,
}

impl SingularityState {
    /// Dormant singularity anchored at the infection's origin
    pub fn new(center: IVec3, seed: u64) -> Self {
        Self {
            center: Some(center),
            phase: SingularityPhase::Dormant,
            rng: RngState::new(seed),
        }
    }

    pub fn kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    /// Whether the state still has work to do on future ticks
    pub fn is_active(&self) -> bool {
        !(self.phase == SingularityPhase::Dormant && self.center.is_none())
    }

    /// Back to dormant with no center
    pub fn finish(&mut self) {
        self.phase = SingularityPhase::Dormant;
        self.center = None;
    }

    /// Flatten to the persisted record layout
    pub fn to_record(&self) -> SingularityRecord {
        let mut record = SingularityRecord {
            state: self.kind().ordinal(),
            center: self.center.map(|c| c.to_array()),
            rng_seed: self.rng.seed,
            rng_stream: self.rng.stream,
            ..Default::default()
        };
        match self.phase {
            SingularityPhase::Dormant | SingularityPhase::Reset => {}
            SingularityPhase::Fusing {
                fuse_ticks_remaining,
                fuse_elapsed,
                shell_collapsed,
            } => {
                record.fuse_ticks_remaining = fuse_ticks_remaining;
                record.fuse_elapsed = fuse_elapsed;
                record.shell_collapsed = shell_collapsed;
            }
            SingularityPhase::Core { phase_delay }
            | SingularityPhase::Dissipation { phase_delay } => {
                record.phase_delay = phase_delay;
            }
            SingularityPhase::Ring {
                phase_delay,
                ring_ticks_remaining,
                ring_elapsed,
            } => {
                record.phase_delay = phase_delay;
                record.ring_ticks_remaining = ring_ticks_remaining;
                record.ring_elapsed = ring_elapsed;
            }
        }
        record
    }

    /// Rebuild from a persisted record
    pub fn from_record(record: &SingularityRecord) -> Result<Self> {
        let kind = PhaseKind::from_ordinal(record.state).ok_or_else(|| {
            CollapseError::invalid(format!("unknown singularity state ordinal {}", record.state))
        })?;
        let phase = match kind {
            PhaseKind::Dormant => SingularityPhase::Dormant,
            PhaseKind::Fusing => SingularityPhase::Fusing {
                fuse_ticks_remaining: record.fuse_ticks_remaining,
                fuse_elapsed: record.fuse_elapsed,
                shell_collapsed: record.shell_collapsed,
            },
            PhaseKind::Core => SingularityPhase::Core {
                phase_delay: record.phase_delay,
            },
            PhaseKind::Ring => SingularityPhase::Ring {
                phase_delay: record.phase_delay,
                ring_ticks_remaining: record.ring_ticks_remaining,
                ring_elapsed: record.ring_elapsed,
            },
            PhaseKind::Dissipation => SingularityPhase::Dissipation {
                phase_delay: record.phase_delay,
            },
            PhaseKind::Reset => SingularityPhase::Reset,
        };
        Ok(Self {
            center: record.center.map(IVec3::from_array),
            phase,
            rng: RngState {
                seed: record.rng_seed,
                stream: record.rng_stream,
            },
        })
    }
}

/// Flat persisted layout: state ordinal, center, every counter and flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingularityRecord {
    pub state: u8,
    pub center: Option<[i32; 3]>,
    pub phase_delay: u32,
    pub fuse_ticks_remaining: u32,
    pub fuse_elapsed: u32,
    pub ring_ticks_remaining: u32,
    pub ring_elapsed: u32,
    pub shell_collapsed: bool,
    pub rng_seed: u64,
    pub rng_stream: u64,
}
