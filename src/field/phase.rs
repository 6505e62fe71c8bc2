//! Time-windowed force phases
//!
//! A field's lifetime is normalized to [0, 100] percent. Each phase claims a
//! `[start, end)` window of that lifetime and decides whether the field pulls,
//! pushes or holds while the window is active.

use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, Result};

/// Direction of a field's force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForcePolarity {
    /// Toward the center
    #[default]
    Pull,
    /// Away from the center
    Push,
    /// No radial force
    Hold,
}

impl ForcePolarity {
    /// Multiplier applied to the center-facing force
    pub fn direction(&self) -> f32 {
        match self {
            ForcePolarity::Pull => 1.0,
            ForcePolarity::Push => -1.0,
            ForcePolarity::Hold => 0.0,
        }
    }
}

/// How loudly a phase notification is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Danger,
}

/// Message surfaced to nearby actors some ticks into a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseNotification {
    pub message: String,
    /// Ticks after the phase starts at which the message fires
    pub tick_offset: u32,
    pub severity: Severity,
}

/// One window of a field's lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcePhase {
    start_percent: f32,
    end_percent: f32,
    polarity: ForcePolarity,
    strength_multiplier: f32,
    notification: Option<PhaseNotification>,
}

impl ForcePhase {
    /// Build a phase, enforcing `0 <= start <= end <= 100` and a positive multiplier
    pub fn new(
        start_percent: f32,
        end_percent: f32,
        polarity: ForcePolarity,
        strength_multiplier: f32,
    ) -> Result<Self> {
        if !(0.0..=100.0).contains(&start_percent)
            || !(0.0..=100.0).contains(&end_percent)
            || start_percent > end_percent
        {
            return Err(CollapseError::invalid(format!(
                "phase window [{start_percent}, {end_percent}) must satisfy 0 <= start <= end <= 100"
            )));
        }
        if !strength_multiplier.is_finite() || strength_multiplier <= 0.0 {
            return Err(CollapseError::invalid(format!(
                "phase strength multiplier must be positive, got {strength_multiplier}"
            )));
        }
        Ok(Self {
            start_percent,
            end_percent,
            polarity,
            strength_multiplier,
            notification: None,
        })
    }

    /// Single phase covering the whole lifetime
    pub fn full(polarity: ForcePolarity) -> Self {
        Self {
            start_percent: 0.0,
            end_percent: 100.0,
            polarity,
            strength_multiplier: 1.0,
            notification: None,
        }
    }

    pub fn with_notification(mut self, notification: PhaseNotification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn start_percent(&self) -> f32 {
        self.start_percent
    }

    pub fn end_percent(&self) -> f32 {
        self.end_percent
    }

    pub fn polarity(&self) -> ForcePolarity {
        self.polarity
    }

    pub fn strength_multiplier(&self) -> f32 {
        self.strength_multiplier
    }

    pub fn notification(&self) -> Option<&PhaseNotification> {
        self.notification.as_ref()
    }

    /// Signed scale applied to the radial force
    pub fn force_scale(&self) -> f32 {
        self.polarity.direction() * self.strength_multiplier
    }

    /// Whether the phase window contains a lifetime percentage
    pub fn contains(&self, percent: f32) -> bool {
        percent >= self.start_percent && percent < self.end_percent
    }
}

/// Resolve the phase active at normalized time `t` (0..=1)
///
/// `t >= 1` resolves to the last phase that reaches 100%, which is the phase
/// used for an expiring field's release burst.
pub fn phase_at(phases: &[ForcePhase], t: f32) -> Option<&ForcePhase> {
    let percent = t.max(0.0) * 100.0;
    if percent >= 100.0 {
        return phases.iter().rev().find(|p| p.end_percent >= 100.0);
    }
    phases.iter().find(|p| p.contains(percent))
}

/// Index form of [`phase_at`], used for change detection
pub fn phase_index_at(phases: &[ForcePhase], t: f32) -> Option<usize> {
    let percent = t.max(0.0) * 100.0;
    if percent >= 100.0 {
        return phases.iter().rposition(|p| p.end_percent >= 100.0);
    }
    phases.iter().position(|p| p.contains(percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vortex() -> Vec<ForcePhase> {
        vec![
            ForcePhase::new(0.0, 40.0, ForcePolarity::Pull, 1.0).unwrap(),
            ForcePhase::new(40.0, 80.0, ForcePolarity::Hold, 1.0).unwrap(),
            ForcePhase::new(80.0, 100.0, ForcePolarity::Push, 2.0).unwrap(),
        ]
    }

    #[test]
    fn test_phase_validation() {
        assert!(ForcePhase::new(-1.0, 10.0, ForcePolarity::Pull, 1.0).is_err());
        assert!(ForcePhase::new(50.0, 40.0, ForcePolarity::Pull, 1.0).is_err());
        assert!(ForcePhase::new(0.0, 101.0, ForcePolarity::Pull, 1.0).is_err());
        assert!(ForcePhase::new(0.0, 100.0, ForcePolarity::Pull, 0.0).is_err());
        assert!(ForcePhase::new(30.0, 30.0, ForcePolarity::Hold, 0.5).is_ok());
    }

    #[test]
    fn test_polarity_direction() {
        assert_eq!(ForcePolarity::Pull.direction(), 1.0);
        assert_eq!(ForcePolarity::Push.direction(), -1.0);
        assert_eq!(ForcePolarity::Hold.direction(), 0.0);
    }

    #[test]
    fn test_boundaries_belong_to_next_phase() {
        let phases = vortex();
        assert_eq!(phase_at(&phases, 0.0).unwrap().polarity(), ForcePolarity::Pull);
        assert_eq!(phase_at(&phases, 0.4).unwrap().polarity(), ForcePolarity::Hold);
        assert_eq!(phase_at(&phases, 0.99).unwrap().polarity(), ForcePolarity::Push);
        assert_eq!(phase_at(&phases, 1.0).unwrap().polarity(), ForcePolarity::Push);
        assert_eq!(phase_index_at(&phases, 1.0), Some(2));
    }

    #[test]
    fn test_gap_resolves_to_none() {
        let phases = vec![ForcePhase::new(0.0, 50.0, ForcePolarity::Pull, 1.0).unwrap()];
        assert!(phase_at(&phases, 0.75).is_none());
        assert!(phase_at(&phases, 1.0).is_none());
        assert!(phase_at(&[], 0.1).is_none());
    }

    proptest! {
        #[test]
        fn covering_windows_resolve_exactly_one_phase(
            mut cuts in prop::collection::vec(1.0f32..99.0, 0..6),
            t in 0.0f32..1.0,
        ) {
            cuts.sort_by(|a, b| a.partial_cmp(b).unwrap());
            cuts.dedup();
            let mut bounds = vec![0.0];
            bounds.extend(cuts);
            bounds.push(100.0);
            let phases: Vec<ForcePhase> = bounds
                .windows(2)
                .map(|w| ForcePhase::new(w[0], w[1], ForcePolarity::Pull, 1.0).unwrap())
                .collect();

            let percent = t * 100.0;
            let matching = phases.iter().filter(|p| p.contains(percent)).count();
            prop_assert_eq!(matching, 1);
            prop_assert!(phase_at(&phases, t).is_some());
        }
    }
}
