//! Easing curves for marker transitions.
//!
//! All curves map [0, 1] onto [0, 1] with fixed endpoints, so a view always
//! starts exactly at its cluster and ends exactly at its own coordinate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Easing curve applied to raw animation progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// Linear interpolation (no easing).
    Linear,
    /// Quadratic ease-in (slow start, fast end).
    QuadraticIn,
    /// Quadratic ease-out (fast start, slow end).
    QuadraticOut,
    /// Cubic smoothstep: slow start and slow end.
    #[default]
    EaseInOut,
    /// Cubic Hermite interpolation with configurable control points.
    /// Formula: c1·3t(1-t)² + c2·3(1-t)t² + t³
    CubicHermite {
        /// First control value.
        c1: f32,
        /// Second control value.
        c2: f32,
    },
}

impl EasingFunction {
    /// Natural ease-out Hermite curve (c1=0.33, c2=1.0).
    pub const SOFT_OUT: Self = Self::CubicHermite { c1: 0.33, c2: 1.0 };

    /// Evaluate the curve at `t`, clamped to [0.0, 1.0].
    #[inline]
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Self::EaseInOut => t * t * (3.0 - 2.0 * t),
            Self::CubicHermite { c1, c2 } => {
                let omt = 1.0 - t;
                c1 * 3.0 * t * omt * omt + c2 * 3.0 * omt * t * t + t * t * t
            }
        }
    }
}
