//! Shapes for the rising segment of the schedule.

use serde::{Deserialize, Serialize};

/// Interpolation used between warmup and cooldown.
///
/// Every shape maps `[0, 1]` onto `[0, 1]`, is continuous, and is
/// non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RampShape {
    /// Straight line.
    Linear,

    /// Cubic ease-out: `1 - (1 - t)^3`.
    ///
    /// Prunes faster early and slows near the target, giving the model more
    /// time to adapt to the last few removals.
    #[default]
    Cubic,

    /// Smoothstep: `t^2 (3 - 2t)`.
    Smoothstep,
}

impl RampShape {
    /// Evaluate the shape at normalized position `t` (clamped to `[0, 1]`).
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            RampShape::Linear => t,
            RampShape::Cubic => 1.0 - (1.0 - t).powi(3),
            RampShape::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }
}
