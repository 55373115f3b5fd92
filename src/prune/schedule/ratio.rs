//! Piecewise sparsity ratio schedule.

use serde::{Deserialize, Serialize};

use super::RampShape;
use crate::error::{Error, Result};

/// Target sparsity as a function of the global step.
///
/// With progress `p = step / max_steps`:
///
/// - `p < warmup_frac` returns `init_ratio`
/// - `warmup_frac <= p < 1 - cooldown_frac` ramps toward `final_ratio`
/// - `p >= 1 - cooldown_frac` returns `final_ratio`
///
/// When `warmup_frac + cooldown_frac >= 1` the ramp is empty and every step
/// past warmup returns `final_ratio`.
///
/// The schedule holds no mutable state; the global step belongs to the
/// training loop.
///
/// # Example
///
/// ```
/// use olvidar::prune::RatioSchedule;
///
/// let schedule = RatioSchedule::new(100, 0.1, 0.1, 0.0, 0.5).unwrap();
/// assert_eq!(schedule.ratio_at(5), 0.0);
/// assert!(schedule.ratio_at(50) > 0.0 && schedule.ratio_at(50) < 0.5);
/// assert_eq!(schedule.ratio_at(95), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSchedule {
    max_steps: usize,
    warmup_frac: f32,
    cooldown_frac: f32,
    init_ratio: f32,
    final_ratio: f32,
    shape: RampShape,
}

impl RatioSchedule {
    /// Create a schedule with the default (cubic) ramp.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchedule` if `max_steps == 0`, a fraction lies outside
    /// `[0, 1]`, or a ratio lies outside `[0, 1]`.
    pub fn new(
        max_steps: usize,
        warmup_frac: f32,
        cooldown_frac: f32,
        init_ratio: f32,
        final_ratio: f32,
    ) -> Result<Self> {
        let schedule = Self {
            max_steps,
            warmup_frac,
            cooldown_frac,
            init_ratio,
            final_ratio,
            shape: RampShape::default(),
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Replace the ramp shape.
    pub fn with_shape(mut self, shape: RampShape) -> Self {
        self.shape = shape;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::InvalidSchedule("max_steps must be > 0".to_string()));
        }
        for (name, value) in [
            ("warmup_frac", self.warmup_frac),
            ("cooldown_frac", self.cooldown_frac),
            ("init_ratio", self.init_ratio),
            ("final_ratio", self.final_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidSchedule(format!(
                    "{name} ({value}) must be between 0.0 and 1.0"
                )));
            }
        }
        Ok(())
    }

    /// Total planned steps.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Ramp shape.
    pub fn shape(&self) -> RampShape {
        self.shape
    }

    /// Ratio held before the ramp.
    pub fn init_ratio(&self) -> f32 {
        self.init_ratio
    }

    /// Ratio held after the ramp.
    pub fn final_ratio(&self) -> f32 {
        self.final_ratio
    }

    /// Normalized training progress for a step (may exceed 1.0).
    pub fn progress(&self, step: usize) -> f64 {
        step as f64 / self.max_steps as f64
    }

    /// Target sparsity at the given step.
    pub fn ratio_at(&self, step: usize) -> f32 {
        // Phase boundaries are compared in f32 so that fractions given as f32
        // literals land exactly on the steps they name.
        let p = self.progress(step) as f32;
        let ramp_end = 1.0 - self.cooldown_frac;

        if p < self.warmup_frac {
            return self.init_ratio;
        }
        if ramp_end <= self.warmup_frac || p >= ramp_end {
            return self.final_ratio;
        }

        let warmup = f64::from(self.warmup_frac);
        let t = (f64::from(p) - warmup) / (f64::from(ramp_end) - warmup);
        let init = f64::from(self.init_ratio);
        let delta = f64::from(self.final_ratio) - init;
        let ratio = (init + delta * self.shape.apply(t)) as f32;

        let lo = self.init_ratio.min(self.final_ratio);
        let hi = self.init_ratio.max(self.final_ratio);
        ratio.clamp(lo, hi)
    }
}

/// Target sparsity at `step` using the default cubic ramp.
///
/// Convenience wrapper over [`RatioSchedule`].
///
/// # Errors
///
/// Returns `InvalidSchedule` if `max_steps == 0` or an argument is out of
/// range.
pub fn ratio_at(
    step: usize,
    max_steps: usize,
    warmup_frac: f32,
    cooldown_frac: f32,
    init_ratio: f32,
    final_ratio: f32,
) -> Result<f32> {
    let schedule = RatioSchedule::new(max_steps, warmup_frac, cooldown_frac, init_ratio, final_ratio)?;
    Ok(schedule.ratio_at(step))
}
