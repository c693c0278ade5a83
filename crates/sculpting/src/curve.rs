//! Brush falloff curve presets.
//!
//! Maps a distance from the brush center to an influence strength in [0, 1].
//! The distance fed into [`FalloffCurve::strength`] is expected to already be
//! hardness-remapped (see [`crate::brush::apply_hardness`]).

use serde::{Deserialize, Serialize};

/// Falloff curve preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FalloffCurve {
    /// Hermite interpolation: 3p² − 2p³.
    #[default]
    Smooth = 0,
    /// Spherical: sqrt(1 − d²).
    Sphere,
    /// Square root of the linear falloff.
    Root,
    /// Quadratic decay, sharp near the edge.
    Sharp,
    /// Straight line: 1 − d.
    Linear,
    /// Smooth falloff raised to the fourth power.
    SmoothSquared,
    /// Inverse square: 1 − d².
    InverseSquare,
    /// Full strength over the whole radius.
    Constant,
}

impl FalloffCurve {
    /// Evaluate the curve at a normalized distance in [0, 1].
    pub fn evaluate(self, normalized_distance: f32) -> f32 {
        let d = normalized_distance.clamp(0.0, 1.0);
        let t = 1.0 - d;
        match self {
            FalloffCurve::Smooth => t * t * (3.0 - 2.0 * t),
            FalloffCurve::Sphere => (1.0 - d * d).max(0.0).sqrt(),
            FalloffCurve::Root => t.max(0.0).sqrt(),
            FalloffCurve::Sharp => t * t,
            FalloffCurve::Linear => t,
            FalloffCurve::SmoothSquared => {
                let s = t * t * (3.0 - 2.0 * t);
                s * s * s * s
            }
            FalloffCurve::InverseSquare => d.mul_add(-d, 1.0),
            FalloffCurve::Constant => 1.0,
        }
    }

    /// Evaluate at an absolute `distance` against `radius`.
    ///
    /// Distances at or beyond the radius always produce 0 (except for the
    /// constant curve, which artists expect to cut off hard at the radius
    /// too). A non-positive radius yields 0; this is the degenerate-geometry
    /// recovery path, never NaN.
    pub fn strength(self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 {
            return 0.0;
        }
        if distance >= radius {
            return 0.0;
        }
        self.evaluate(distance / radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_curves_bounded() {
        let curves = [
            FalloffCurve::Smooth,
            FalloffCurve::Sphere,
            FalloffCurve::Root,
            FalloffCurve::Sharp,
            FalloffCurve::Linear,
            FalloffCurve::SmoothSquared,
            FalloffCurve::InverseSquare,
            FalloffCurve::Constant,
        ];
        for curve in curves {
            for i in 0..=10 {
                let s = curve.evaluate(i as f32 / 10.0);
                assert!((0.0..=1.0).contains(&s), "{curve:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn test_full_strength_at_center() {
        assert!((FalloffCurve::Smooth.evaluate(0.0) - 1.0).abs() < 1e-6);
        assert!((FalloffCurve::Linear.evaluate(0.0) - 1.0).abs() < 1e-6);
        assert!((FalloffCurve::Sphere.evaluate(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_outside_radius() {
        for curve in [FalloffCurve::Smooth, FalloffCurve::Constant] {
            assert_eq!(curve.strength(1.5, 1.0), 0.0);
            assert_eq!(curve.strength(1.0, 1.0), 0.0);
        }
    }

    #[test]
    fn test_degenerate_radius() {
        assert_eq!(FalloffCurve::Smooth.strength(0.5, 0.0), 0.0);
        assert_eq!(FalloffCurve::Smooth.strength(0.5, -1.0), 0.0);
    }
}
