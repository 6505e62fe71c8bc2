//! Falloff curves
//!
//! Map a distance within a radius to a strength multiplier. Every curve is 0
//! outside the radius. Apart from `Constant` (a step) and `Inverse` (rises
//! toward the edge), curves go from full strength at the center to 0 at the
//! edge.

use serde::{Deserialize, Serialize};

/// Named falloff curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FalloffCurve {
    /// Full strength everywhere inside the radius
    Constant,
    /// `1 - d/r`
    #[default]
    Linear,
    /// `1 - (d/r)^2`
    Quadratic,
    /// `1 - (d/r)^3`
    Cubic,
    /// Bell curve with sigma = r/3, rescaled to hit 0 at the edge
    Gaussian,
    /// `e^(-3d/r)`, rescaled to hit 0 at the edge
    Exponential,
    /// 0 at the center, full strength at the edge
    Inverse,
    /// Smoothstep easing from 1 down to 0
    Smooth,
}

impl FalloffCurve {
    pub const ALL: [FalloffCurve; 8] = [
        FalloffCurve::Constant,
        FalloffCurve::Linear,
        FalloffCurve::Quadratic,
        FalloffCurve::Cubic,
        FalloffCurve::Gaussian,
        FalloffCurve::Exponential,
        FalloffCurve::Inverse,
        FalloffCurve::Smooth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FalloffCurve::Constant => "constant",
            FalloffCurve::Linear => "linear",
            FalloffCurve::Quadratic => "quadratic",
            FalloffCurve::Cubic => "cubic",
            FalloffCurve::Gaussian => "gaussian",
            FalloffCurve::Exponential => "exponential",
            FalloffCurve::Inverse => "inverse",
            FalloffCurve::Smooth => "smooth",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|curve| curve.as_str().eq_ignore_ascii_case(s))
    }

    /// Multiplier in [0, 1] for a distance inside `radius`
    pub fn multiplier(&self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 || distance > radius {
            return 0.0;
        }
        let t = (distance.max(0.0) / radius).clamp(0.0, 1.0);

        match self {
            FalloffCurve::Constant => 1.0,
            FalloffCurve::Linear => (1.0 - t).clamp(0.0, 1.0),
            FalloffCurve::Quadratic => (1.0 - t * t).clamp(0.0, 1.0),
            FalloffCurve::Cubic => (1.0 - t * t * t).clamp(0.0, 1.0),
            FalloffCurve::Gaussian => {
                // sigma = r/3 in normalized units is 1/3, so exponent is -4.5 t^2
                let edge = (-4.5f32).exp();
                ((-4.5 * t * t).exp() - edge) / (1.0 - edge)
            }
            FalloffCurve::Exponential => {
                let edge = (-3.0f32).exp();
                ((-3.0 * t).exp() - edge) / (1.0 - edge)
            }
            FalloffCurve::Inverse => t,
            FalloffCurve::Smooth => (1.0 - t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0),
        }
    }

    /// Effective strength at `distance`
    pub fn strength_at(&self, strength: f32, distance: f32, radius: f32) -> f32 {
        strength.max(0.0) * self.multiplier(distance, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TAPERED: [FalloffCurve; 6] = [
        FalloffCurve::Linear,
        FalloffCurve::Quadratic,
        FalloffCurve::Cubic,
        FalloffCurve::Gaussian,
        FalloffCurve::Exponential,
        FalloffCurve::Smooth,
    ];

    #[test]
    fn test_constant_is_step() {
        assert_eq!(FalloffCurve::Constant.strength_at(3.0, 9.99, 10.0), 3.0);
        assert_eq!(FalloffCurve::Constant.strength_at(3.0, 10.01, 10.0), 0.0);
    }

    #[test]
    fn test_inverse_rises_to_edge() {
        let curve = FalloffCurve::Inverse;
        assert_eq!(curve.strength_at(2.0, 0.0, 10.0), 0.0);
        assert!((curve.strength_at(2.0, 10.0, 10.0) - 2.0).abs() < 1e-6);
        assert!(curve.strength_at(2.0, 3.0, 10.0) < curve.strength_at(2.0, 6.0, 10.0));
    }

    #[test]
    fn test_zero_radius_is_zero() {
        for curve in FalloffCurve::ALL {
            assert_eq!(curve.strength_at(5.0, 0.0, 0.0), 0.0);
        }
    }

    #[test]
    fn test_from_str_round_trips_names() {
        assert_eq!(FalloffCurve::from_str("SMOOTH"), Some(FalloffCurve::Smooth));
        assert_eq!(FalloffCurve::from_str("cosine"), None);
    }

    proptest! {
        #[test]
        fn tapered_curves_full_at_center_zero_at_edge(
            radius in 0.01f32..500.0,
            strength in 0.0f32..100.0,
        ) {
            for curve in TAPERED {
                let center = curve.strength_at(strength, 0.0, radius);
                let edge = curve.strength_at(strength, radius, radius);
                prop_assert!(
                    (center - strength).abs() <= strength * 1e-5 + 1e-6,
                    "{curve:?} center {center}"
                );
                prop_assert!(edge.abs() <= 1e-5 * strength.max(1.0), "{curve:?} edge {edge}");
            }
        }

        #[test]
        fn multipliers_stay_in_unit_range(
            radius in 0.01f32..500.0,
            frac in 0.0f32..1.5,
        ) {
            for curve in FalloffCurve::ALL {
                let m = curve.multiplier(radius * frac, radius);
                prop_assert!((0.0..=1.0).contains(&m), "{curve:?} gave {m}");
            }
        }
    }
}
