//! Force zones: a radius, a base strength and a falloff curve

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::falloff::FalloffCurve;
use crate::error::{CollapseError, Result};

/// Spherical zone of influence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceZone {
    radius: f32,
    strength: f32,
    curve: FalloffCurve,
}

impl ForceZone {
    /// Build a zone, rejecting non-positive radii and negative strengths
    pub fn new(radius: f32, strength: f32, curve: FalloffCurve) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(CollapseError::invalid(format!(
                "zone radius must be positive, got {radius}"
            )));
        }
        if !strength.is_finite() || strength < 0.0 {
            return Err(CollapseError::invalid(format!(
                "zone strength must not be negative, got {strength}"
            )));
        }
        Ok(Self {
            radius,
            strength,
            curve,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn curve(&self) -> FalloffCurve {
        self.curve
    }

    /// Effective strength at a distance from the zone center (0 outside)
    pub fn strength_at(&self, distance: f32) -> f32 {
        self.curve.strength_at(self.strength, distance, self.radius)
    }

    /// Velocity impulse pushing `position` away from `center`
    ///
    /// Negative `sign` pulls instead. Returns zero at the exact center.
    pub fn impulse(&self, center: Vec3, position: Vec3, sign: f32) -> Vec3 {
        let offset = position - center;
        let distance = offset.length();
        let magnitude = self.strength_at(distance);
        if magnitude <= 0.0 {
            return Vec3::ZERO;
        }
        offset.normalize_or_zero() * magnitude * sign
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_radius() {
        assert!(ForceZone::new(0.0, 1.0, FalloffCurve::Linear).is_err());
        assert!(ForceZone::new(-3.0, 1.0, FalloffCurve::Linear).is_err());
        assert!(ForceZone::new(f32::NAN, 1.0, FalloffCurve::Linear).is_err());
        assert!(ForceZone::new(5.0, -0.1, FalloffCurve::Linear).is_err());
    }

    #[test]
    fn test_strength_outside_radius_is_zero() {
        let zone = ForceZone::new(10.0, 4.0, FalloffCurve::Quadratic).unwrap();
        assert_eq!(zone.strength_at(0.0), 4.0);
        assert_eq!(zone.strength_at(10.5), 0.0);
        assert!((zone.strength_at(5.0) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_direction() {
        let zone = ForceZone::new(10.0, 2.0, FalloffCurve::Constant).unwrap();
        let push = zone.impulse(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), 1.0);
        assert!(push.x > 0.0);
        let pull = zone.impulse(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), -1.0);
        assert!(pull.x < 0.0);
        assert_eq!(zone.impulse(Vec3::ZERO, Vec3::ZERO, 1.0), Vec3::ZERO);
    }
}
