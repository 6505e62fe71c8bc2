//! Phase handlers
//!
//! `step` is a pure transition function: it takes the current state, this
//! tick's inputs and the current profile, and returns the next state plus the
//! effects to perform. At most one transition happens per call, and it is
//! always the last thing a handler does.

use std::f32::consts::TAU;

use rand::Rng;

use super::effects::CollapseEffect;
use super::state::{PhaseKind, SingularityPhase, SingularityState};
use crate::consts::{RING_BASE_RADIUS, RING_GROWTH_PER_TICK};
use crate::polar_to_horizontal;
use crate::profile::DimensionProfile;

/// External readings for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub infection_health: f32,
    pub ticks_until_final_wave: Option<i64>,
    pub should_start_reset: bool,
    pub reset_complete: bool,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: SingularityState,
    pub effects: Vec<CollapseEffect>,
    /// `(from, to)` when the phase changed this tick
    pub transition: Option<(PhaseKind, PhaseKind)>,
}

impl Step {
    /// Whether anything persisted differs from the input state
    pub fn changed_from(&self, previous: &SingularityState) -> bool {
        &self.state != previous
    }
}

/// Radius the ring reaches by the time it finishes
pub fn final_ring_radius(profile: &DimensionProfile) -> f32 {
    RING_BASE_RADIUS + profile.ring_duration_ticks() as f32 * RING_GROWTH_PER_TICK
}

/// Advance a singularity by one tick
pub fn step(state: &SingularityState, input: &TickInput, profile: &DimensionProfile) -> Step {
    let mut next = *state;
    let mut effects = Vec::new();

    match state.phase {
        SingularityPhase::Dormant => on_dormant(&mut next, input, profile),
        SingularityPhase::Fusing { .. } => on_fusing(&mut next, profile, &mut effects),
        SingularityPhase::Core { .. } => on_core(&mut next, profile, &mut effects),
        SingularityPhase::Ring { .. } => on_ring(&mut next, profile, &mut effects),
        SingularityPhase::Dissipation { .. } => on_dissipation(&mut next, input, &mut effects),
        SingularityPhase::Reset => on_reset(&mut next, input, &mut effects),
    }

    let (from, to) = (state.kind(), next.kind());
    let transition = (from != to).then_some((from, to));
    Step {
        state: next,
        effects,
        transition,
    }
}

fn on_dormant(state: &mut SingularityState, input: &TickInput, profile: &DimensionProfile) {
    if state.center.is_none() || input.infection_health > 0.0 {
        return;
    }
    let Some(remaining) = input.ticks_until_final_wave else {
        return;
    };
    let fuse_delay = profile.fuse_delay_ticks;
    if remaining < 0 || remaining > i64::from(fuse_delay) {
        return;
    }
    state.phase = SingularityPhase::Fusing {
        fuse_ticks_remaining: fuse_delay,
        fuse_elapsed: 0,
        shell_collapsed: false,
    };
}

fn on_fusing(
    state: &mut SingularityState,
    profile: &DimensionProfile,
    effects: &mut Vec<CollapseEffect>,
) {
    let SingularityPhase::Fusing {
        fuse_ticks_remaining,
        fuse_elapsed,
        shell_collapsed,
    } = state.phase
    else {
        return;
    };
    let Some(center) = state.center else {
        log::warn!("Fusing singularity lost its center, returning to dormant");
        state.finish();
        return;
    };

    let remaining = fuse_ticks_remaining.saturating_sub(1);
    let elapsed = fuse_elapsed.saturating_add(1);
    effects.push(CollapseEffect::FuseTick {
        center,
        elapsed,
        remaining,
    });
    let pulse = profile.fuse_pulse_interval_ticks;
    if pulse > 0 && elapsed % pulse == 0 {
        effects.push(CollapseEffect::FusePulse { center, elapsed });
    }
    effects.push(CollapseEffect::MaintainFuseEntities { center });

    let mut collapsed = shell_collapsed;
    if !collapsed && profile.fuse_collapse_ticks > 0 && elapsed >= profile.fuse_collapse_ticks {
        collapsed = true;
        effects.push(CollapseEffect::ShellCollapse { center });
    }

    if remaining == 0 {
        effects.push(CollapseEffect::ClearFuseEntities { center });
        state.phase = SingularityPhase::Core {
            phase_delay: profile.core_charge_ticks,
        };
        return;
    }
    state.phase = SingularityPhase::Fusing {
        fuse_ticks_remaining: remaining,
        fuse_elapsed: elapsed,
        shell_collapsed: collapsed,
    };
}

fn on_core(
    state: &mut SingularityState,
    profile: &DimensionProfile,
    effects: &mut Vec<CollapseEffect>,
) {
    let SingularityPhase::Core { phase_delay } = state.phase else {
        return;
    };
    let Some(center) = state.center else {
        log::warn!("Core singularity lost its center, returning to dormant");
        state.finish();
        return;
    };

    if phase_delay > 0 {
        let remaining = phase_delay - 1;
        effects.push(CollapseEffect::ChargeTick { center, remaining });
        state.phase = SingularityPhase::Core {
            phase_delay: remaining,
        };
        return;
    }

    effects.push(CollapseEffect::PushActors {
        center,
        radius: profile.push_radius,
        strength: profile.push_strength,
    });
    effects.push(CollapseEffect::Detonation {
        center,
        power: profile.detonation_power,
    });
    effects.push(CollapseEffect::DeployBorder {
        center,
        radius: final_ring_radius(profile),
    });
    let ring_ticks = profile.ring_duration_ticks();
    state.phase = SingularityPhase::Ring {
        phase_delay: ring_ticks,
        ring_ticks_remaining: ring_ticks,
        ring_elapsed: 0,
    };
}

fn on_ring(
    state: &mut SingularityState,
    profile: &DimensionProfile,
    effects: &mut Vec<CollapseEffect>,
) {
    let SingularityPhase::Ring {
        phase_delay,
        ring_ticks_remaining,
        ring_elapsed,
    } = state.phase
    else {
        return;
    };
    let Some(center) = state.center else {
        log::warn!("Ring singularity has no center, skipping to dissipation");
        state.phase = SingularityPhase::Dissipation {
            phase_delay: profile.reset_delay_ticks,
        };
        return;
    };

    if phase_delay > 0 {
        state.phase = SingularityPhase::Ring {
            phase_delay: phase_delay - 1,
            ring_ticks_remaining,
            ring_elapsed,
        };
        return;
    }

    if ring_ticks_remaining == 0 {
        effects.push(CollapseEffect::SyncBorder { center });
        state.phase = SingularityPhase::Dissipation {
            phase_delay: profile.reset_delay_ticks,
        };
        return;
    }

    let radius = RING_BASE_RADIUS + ring_elapsed as f32 * RING_GROWTH_PER_TICK;
    effects.push(CollapseEffect::RingPulse { center, radius });

    let mut rng = state.rng.next_rng();
    let jitter = profile.ring_jitter;
    for _ in 0..profile.columns_per_tick {
        let angle = rng.random_range(0.0..TAU);
        let r = if jitter > 0.0 {
            radius + rng.random_range(-jitter..=jitter)
        } else {
            radius
        };
        let (dx, dz) = polar_to_horizontal(r.max(0.0), angle);
        effects.push(CollapseEffect::CarveColumn {
            x: center.x + dx.round() as i32,
            z: center.z + dz.round() as i32,
            top_down: rng.random_bool(0.5),
        });
    }

    effects.push(CollapseEffect::PullActors {
        center,
        ring_radius: radius,
        reach: profile.ring_pull_radius,
        strength: profile.ring_pull_strength,
    });

    state.phase = SingularityPhase::Ring {
        phase_delay: 0,
        ring_ticks_remaining: ring_ticks_remaining - 1,
        ring_elapsed: ring_elapsed.saturating_add(1),
    };
}

fn on_dissipation(
    state: &mut SingularityState,
    input: &TickInput,
    effects: &mut Vec<CollapseEffect>,
) {
    let SingularityPhase::Dissipation { phase_delay } = state.phase else {
        return;
    };
    let Some(center) = state.center else {
        log::warn!("Dissipating singularity has no center, finishing early");
        state.finish();
        return;
    };

    effects.push(CollapseEffect::DissipationTick {
        center,
        remaining: phase_delay,
    });
    if phase_delay > 0 {
        state.phase = SingularityPhase::Dissipation {
            phase_delay: phase_delay - 1,
        };
        return;
    }

    if input.should_start_reset {
        // The handoff tick runs the first reset step
        effects.push(CollapseEffect::ProcessReset);
        state.phase = SingularityPhase::Reset;
    } else {
        state.finish();
    }
}

/// One reset step per tick until the host reports completion
///
/// `reset_complete` is read before this tick's step, so it reflects the steps
/// already taken. The handoff from dissipation always takes the first one.
fn on_reset(state: &mut SingularityState, input: &TickInput, effects: &mut Vec<CollapseEffect>) {
    if input.reset_complete {
        state.finish();
        return;
    }
    effects.push(CollapseEffect::ProcessReset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    /// Ticks a fresh `Core` phase spends charging before it detonates
    fn core_ticks(profile: &DimensionProfile) -> u32 {
        profile.core_charge_ticks + 1
    }

    /// Ticks a fresh `Ring` phase lasts, including the delay and the handoff tick
    fn ring_ticks(profile: &DimensionProfile) -> u32 {
        profile.ring_duration_ticks() * 2 + 1
    }

    fn column_offset(center: IVec3, x: i32, z: i32) -> (i32, i32) {
        (x - center.x, z - center.z)
    }

    fn profile() -> DimensionProfile {
        DimensionProfile {
            fuse_delay_ticks: 50,
            fuse_collapse_ticks: 0,
            fuse_pulse_interval_ticks: 10,
            core_charge_ticks: 5,
            collapse_tick_interval: 2,
            columns_per_tick: 3,
            reset_delay_ticks: 4,
            ..Default::default()
        }
    }

    fn fusing_input() -> TickInput {
        TickInput {
            infection_health: 0.0,
            ticks_until_final_wave: Some(50),
            ..Default::default()
        }
    }

    fn run_until_change(
        state: &mut SingularityState,
        input: &TickInput,
        profile: &DimensionProfile,
        limit: u32,
    ) -> (u32, Vec<CollapseEffect>) {
        let start = state.kind();
        let mut effects = Vec::new();
        for n in 1..=limit {
            let out = step(state, input, profile);
            *state = out.state;
            effects.extend(out.effects);
            if state.kind() != start {
                return (n, effects);
            }
        }
        (limit + 1, effects)
    }

    #[test]
    fn test_dormant_waits_for_health_and_window() {
        let profile = profile();
        let state = SingularityState::new(IVec3::ZERO, 1);

        let healthy = TickInput {
            infection_health: 3.0,
            ..fusing_input()
        };
        assert_eq!(step(&state, &healthy, &profile).state, state);

        let too_early = TickInput {
            ticks_until_final_wave: Some(51),
            ..fusing_input()
        };
        assert_eq!(step(&state, &too_early, &profile).state, state);

        let no_wave = TickInput {
            ticks_until_final_wave: None,
            ..fusing_input()
        };
        assert!(step(&state, &no_wave, &profile).transition.is_none());
    }

    #[test]
    fn test_dormant_without_center_never_fuses() {
        let mut state = SingularityState::new(IVec3::ZERO, 1);
        state.center = None;
        let out = step(&state, &fusing_input(), &profile());
        assert_eq!(out.state.kind(), PhaseKind::Dormant);
    }

    #[test]
    fn test_dormant_enters_on_fusing() {
        let state = SingularityState::new(IVec3::ZERO, 1);
        let out = step(&state, &fusing_input(), &profile());
        assert_eq!(out.transition, Some((PhaseKind::Dormant, PhaseKind::Fusing)));
        assert_eq!(
            out.state.phase,
            SingularityPhase::Fusing {
                fuse_ticks_remaining: 50,
                fuse_elapsed: 0,
                shell_collapsed: false,
            }
        );
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_fusing_transitions_on_exact_tick() {
        let profile = DimensionProfile {
            fuse_delay_ticks: 400,
            ..profile()
        };
        let mut state = SingularityState::new(IVec3::ZERO, 1);
        state.phase = SingularityPhase::Fusing {
            fuse_ticks_remaining: 400,
            fuse_elapsed: 0,
            shell_collapsed: false,
        };
        let (ticks, effects) = run_until_change(&mut state, &TickInput::default(), &profile, 1000);
        assert_eq!(ticks, 400);
        assert_eq!(state.phase, SingularityPhase::Core { phase_delay: 5 });
        assert!(matches!(effects.last(), Some(CollapseEffect::ClearFuseEntities { .. })));
        let pulses = effects
            .iter()
            .filter(|e| matches!(e, CollapseEffect::FusePulse { .. }))
            .count();
        assert_eq!(pulses, 40);
    }

    #[test]
    fn test_shell_collapses_once() {
        let profile = DimensionProfile {
            fuse_collapse_ticks: 10,
            ..profile()
        };
        let mut state = SingularityState::new(IVec3::ZERO, 1);
        state.phase = SingularityPhase::Fusing {
            fuse_ticks_remaining: 50,
            fuse_elapsed: 0,
            shell_collapsed: false,
        };
        let (_, effects) = run_until_change(&mut state, &TickInput::default(), &profile, 100);
        let collapses = effects
            .iter()
            .filter(|e| matches!(e, CollapseEffect::ShellCollapse { .. }))
            .count();
        assert_eq!(collapses, 1);
    }

    #[test]
    fn test_core_charges_then_detonates() {
        let profile = profile();
        let mut state = SingularityState::new(IVec3::new(4, 70, 4), 1);
        state.phase = SingularityPhase::Core { phase_delay: 5 };
        let (ticks, effects) = run_until_change(&mut state, &TickInput::default(), &profile, 100);
        assert_eq!(ticks, core_ticks(&profile));
        let charges = effects
            .iter()
            .filter(|e| matches!(e, CollapseEffect::ChargeTick { .. }))
            .count();
        assert_eq!(charges, 5);
        assert!(effects.iter().any(|e| matches!(e, CollapseEffect::Detonation { .. })));
        assert!(effects.iter().any(|e| matches!(e, CollapseEffect::DeployBorder { .. })));
        assert_eq!(
            state.phase,
            SingularityPhase::Ring {
                phase_delay: 6,
                ring_ticks_remaining: 6,
                ring_elapsed: 0,
            }
        );
    }

    #[test]
    fn test_ring_carves_expanding_columns() {
        let profile = profile();
        let center = IVec3::new(100, 64, -40);
        let mut state = SingularityState::new(center, 7);
        state.phase = SingularityPhase::Ring {
            phase_delay: 0,
            ring_ticks_remaining: 6,
            ring_elapsed: 0,
        };

        let (ticks, effects) = run_until_change(&mut state, &TickInput::default(), &profile, 100);
        assert_eq!(ticks, 7);
        assert_eq!(state.phase, SingularityPhase::Dissipation { phase_delay: 4 });

        let columns: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                CollapseEffect::CarveColumn { x, z, .. } => Some(column_offset(center, *x, *z)),
                _ => None,
            })
            .collect();
        assert_eq!(columns.len(), 6 * 3);
        let max_r = 8.0 + 5.0 * 0.25 + profile.ring_jitter + 1.0;
        for (dx, dz) in columns {
            let r = ((dx * dx + dz * dz) as f32).sqrt();
            assert!(r <= max_r && r >= 8.0 - profile.ring_jitter - 1.0, "column at r={r}");
        }

        let radii: Vec<f32> = effects
            .iter()
            .filter_map(|e| match e {
                CollapseEffect::RingPulse { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert_eq!(radii, vec![8.0, 8.25, 8.5, 8.75, 9.0, 9.25]);
        assert!(matches!(effects.last(), Some(CollapseEffect::SyncBorder { .. })));
    }

    #[test]
    fn test_ring_delay_only_decrements() {
        let mut state = SingularityState::new(IVec3::ZERO, 1);
        state.phase = SingularityPhase::Ring {
            phase_delay: 2,
            ring_ticks_remaining: 6,
            ring_elapsed: 0,
        };
        let out = step(&state, &TickInput::default(), &profile());
        assert!(out.effects.is_empty());
        assert_eq!(out.state.phase.phase_delay(), Some(1));
        assert_eq!(out.state.rng, state.rng);
    }

    #[test]
    fn test_ring_same_seed_same_columns() {
        let mut state = SingularityState::new(IVec3::ZERO, 99);
        state.phase = SingularityPhase::Ring {
            phase_delay: 0,
            ring_ticks_remaining: 3,
            ring_elapsed: 0,
        };
        let a = step(&state, &TickInput::default(), &profile());
        let b = step(&state, &TickInput::default(), &profile());
        assert_eq!(a.effects, b.effects);
    }

    #[test]
    fn test_missing_center_self_terminates() {
        let profile = profile();
        let mut ring = SingularityState::new(IVec3::ZERO, 1);
        ring.center = None;
        ring.phase = SingularityPhase::Ring {
            phase_delay: 3,
            ring_ticks_remaining: 3,
            ring_elapsed: 0,
        };
        let out = step(&ring, &TickInput::default(), &profile);
        assert_eq!(out.state.phase, SingularityPhase::Dissipation { phase_delay: 4 });

        let out = step(&out.state, &TickInput::default(), &profile);
        assert_eq!(out.state.kind(), PhaseKind::Dormant);
        assert!(out.state.center.is_none());
    }

    #[test]
    fn test_dissipation_hands_off_to_reset() {
        let mut state = SingularityState::new(IVec3::ZERO, 1);
        state.phase = SingularityPhase::Dissipation { phase_delay: 0 };
        let input = TickInput {
            should_start_reset: true,
            ..Default::default()
        };
        let out = step(&state, &input, &profile());
        assert_eq!(out.state.phase, SingularityPhase::Reset);
        assert!(out.state.center.is_some());
        assert_eq!(out.effects.last(), Some(&CollapseEffect::ProcessReset));

        let waiting = step(&out.state, &TickInput::default(), &profile());
        assert_eq!(waiting.effects, vec![CollapseEffect::ProcessReset]);
        assert_eq!(waiting.state.phase, SingularityPhase::Reset);

        let done = TickInput {
            reset_complete: true,
            ..Default::default()
        };
        let finished = step(&waiting.state, &done, &profile());
        assert_eq!(finished.state.kind(), PhaseKind::Dormant);
        assert!(finished.state.center.is_none());
    }

    #[test]
    fn test_reset_steps_once_when_already_complete() {
        let mut state = SingularityState::new(IVec3::ZERO, 1);
        state.phase = SingularityPhase::Dissipation { phase_delay: 0 };
        let input = TickInput {
            should_start_reset: true,
            reset_complete: true,
            ..Default::default()
        };
        let handoff = step(&state, &input, &profile());
        assert_eq!(handoff.state.phase, SingularityPhase::Reset);
        let finished = step(&handoff.state, &input, &profile());
        assert_eq!(finished.state.kind(), PhaseKind::Dormant);

        let steps = handoff
            .effects
            .iter()
            .chain(&finished.effects)
            .filter(|e| matches!(e, CollapseEffect::ProcessReset))
            .count();
        assert_eq!(steps, 1);
    }

    #[test]
    fn test_full_cycle_timing() {
        let profile = profile();
        let mut state = SingularityState::new(IVec3::new(0, 64, 0), 3);

        let out = step(&state, &fusing_input(), &profile);
        state = out.state;
        assert_eq!(state.kind(), PhaseKind::Fusing);

        let idle = TickInput::default();
        let (n, _) = run_until_change(&mut state, &idle, &profile, 10_000);
        assert_eq!(n, 50);
        assert_eq!(state.kind(), PhaseKind::Core);

        let (n, _) = run_until_change(&mut state, &idle, &profile, 10_000);
        assert_eq!(n, core_ticks(&profile));
        assert_eq!(state.kind(), PhaseKind::Ring);

        let (n, _) = run_until_change(&mut state, &idle, &profile, 10_000);
        assert_eq!(n, ring_ticks(&profile));
        assert_eq!(state.kind(), PhaseKind::Dissipation);

        let (n, _) = run_until_change(&mut state, &idle, &profile, 10_000);
        assert_eq!(n, profile.reset_delay_ticks + 1);
        assert_eq!(state.kind(), PhaseKind::Dormant);
        assert!(state.center.is_none());
    }
}
