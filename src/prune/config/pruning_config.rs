//! Main unlearning-pruning configuration struct.

use serde::{Deserialize, Serialize};

use super::{Granularity, PruneMetric};
use crate::error::{Error, Result};
use crate::prune::dual::Normalization;
use crate::prune::schedule::RampShape;

/// Configuration for sensitivity-guided unlearning pruning.
///
/// Defaults follow the LoRA unlearning trainer: prune up to half of the
/// parameters, ramping between 10% and 90% of training, checking every 10
/// steps.
///
/// # Example
///
/// ```
/// use olvidar::prune::{PruneMetric, UnlearnPruneConfig};
///
/// let config = UnlearnPruneConfig::default()
///     .with_ratio(0.3)
///     .with_prune_metric(PruneMetric::Grad)
///     .with_prune_freq(5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlearnPruneConfig {
    /// Final sparsity ratio (0.0 to 1.0).
    ratio: f32,

    /// Sparsity before the ramp starts.
    init_ratio: f32,

    /// Fraction of training spent at `init_ratio`.
    warmup_iters: f32,

    /// Fraction of training held at `ratio` at the end.
    cooldown_iters: f32,

    /// Attempt pruning every N global steps.
    prune_freq: usize,

    /// Importance metric.
    prune_metric: PruneMetric,

    /// Minimum dual score a unit needs before it may be pruned.
    unlearning_threshold: f32,

    /// Lowest acceptable retain-set performance (fraction of baseline).
    min_retain_performance: f32,

    /// Pruning unit.
    granularity: Granularity,

    /// Shape of the rising segment of the ratio schedule.
    ramp: RampShape,

    /// Normalization applied to each stream before combination.
    normalization: Normalization,

    /// Division guard in the dual score.
    eps: f64,

    /// Cap on a single step's contribution, as a multiple of the group's mean.
    outlier_clip: Option<f64>,
}

impl Default for UnlearnPruneConfig {
    fn default() -> Self {
        Self {
            ratio: 0.5,
            init_ratio: 0.0,
            warmup_iters: 0.1,
            cooldown_iters: 0.1,
            prune_freq: 10,
            prune_metric: PruneMetric::default(),
            unlearning_threshold: 0.1,
            min_retain_performance: 0.9,
            granularity: Granularity::default(),
            ramp: RampShape::default(),
            normalization: Normalization::default(),
            eps: 1e-8,
            outlier_clip: Some(10.0),
        }
    }
}

impl UnlearnPruneConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the final sparsity ratio.
    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set the initial sparsity ratio.
    pub fn with_init_ratio(mut self, init_ratio: f32) -> Self {
        self.init_ratio = init_ratio;
        self
    }

    /// Set the warmup fraction.
    pub fn with_warmup_iters(mut self, warmup: f32) -> Self {
        self.warmup_iters = warmup;
        self
    }

    /// Set the cooldown fraction.
    pub fn with_cooldown_iters(mut self, cooldown: f32) -> Self {
        self.cooldown_iters = cooldown;
        self
    }

    /// Set the pruning cadence.
    pub fn with_prune_freq(mut self, freq: usize) -> Self {
        self.prune_freq = freq;
        self
    }

    /// Set the importance metric.
    pub fn with_prune_metric(mut self, metric: PruneMetric) -> Self {
        self.prune_metric = metric;
        self
    }

    /// Set the unlearning threshold.
    pub fn with_unlearning_threshold(mut self, threshold: f32) -> Self {
        self.unlearning_threshold = threshold;
        self
    }

    /// Set the minimum retain performance.
    pub fn with_min_retain_performance(mut self, min: f32) -> Self {
        self.min_retain_performance = min;
        self
    }

    /// Set the pruning granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set the ramp shape.
    pub fn with_ramp(mut self, ramp: RampShape) -> Self {
        self.ramp = ramp;
        self
    }

    /// Set the normalization.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Set the dual-score epsilon.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set (or disable) the outlier clip.
    pub fn with_outlier_clip(mut self, clip: Option<f64>) -> Self {
        self.outlier_clip = clip;
        self
    }

    /// Get the final sparsity ratio.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Get the initial sparsity ratio.
    pub fn init_ratio(&self) -> f32 {
        self.init_ratio
    }

    /// Get the warmup fraction.
    pub fn warmup_iters(&self) -> f32 {
        self.warmup_iters
    }

    /// Get the cooldown fraction.
    pub fn cooldown_iters(&self) -> f32 {
        self.cooldown_iters
    }

    /// Get the pruning cadence.
    pub fn prune_freq(&self) -> usize {
        self.prune_freq
    }

    /// Get the importance metric.
    pub fn prune_metric(&self) -> PruneMetric {
        self.prune_metric
    }

    /// Get the unlearning threshold.
    pub fn unlearning_threshold(&self) -> f32 {
        self.unlearning_threshold
    }

    /// Get the minimum retain performance.
    pub fn min_retain_performance(&self) -> f32 {
        self.min_retain_performance
    }

    /// Get the pruning granularity.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Get the ramp shape.
    pub fn ramp(&self) -> RampShape {
        self.ramp
    }

    /// Get the normalization.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Get the dual-score epsilon.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Get the outlier clip.
    pub fn outlier_clip(&self) -> Option<f64> {
        self.outlier_clip
    }

    /// Validate the configuration.
    ///
    /// Schedule problems surface as `InvalidSchedule`, everything else as
    /// `Config`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("ratio", self.ratio), ("init_ratio", self.init_ratio)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidSchedule(format!(
                    "{name} ({value}) must be between 0.0 and 1.0"
                )));
            }
        }
        if self.init_ratio > self.ratio {
            return Err(Error::InvalidSchedule(format!(
                "init_ratio ({}) must not exceed ratio ({})",
                self.init_ratio, self.ratio
            )));
        }
        for (name, value) in
            [("warmup_iters", self.warmup_iters), ("cooldown_iters", self.cooldown_iters)]
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidSchedule(format!(
                    "{name} ({value}) must be a fraction between 0.0 and 1.0"
                )));
            }
        }
        if self.prune_freq == 0 {
            return Err(Error::InvalidSchedule("prune_freq must be > 0".to_string()));
        }
        if !self.unlearning_threshold.is_finite() {
            return Err(Error::Config(format!(
                "unlearning_threshold ({}) must be finite",
                self.unlearning_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_retain_performance) {
            return Err(Error::Config(format!(
                "min_retain_performance ({}) must be between 0.0 and 1.0",
                self.min_retain_performance
            )));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(Error::Config(format!("eps ({}) must be positive", self.eps)));
        }
        if let Some(clip) = self.outlier_clip {
            if !(clip.is_finite() && clip > 0.0) {
                return Err(Error::Config(format!("outlier_clip ({clip}) must be positive")));
            }
        }
        Ok(())
    }
}
