//! Training loop configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Loop-level settings of an unlearning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlearnTrainConfig {
    /// Passes over the forget and retain data.
    pub epochs: usize,
    /// Hard cap on optimizer-level steps; derived from `epochs` when unset.
    pub max_steps: Option<usize>,
    /// Batches folded into one step.
    pub gradient_accumulation_steps: usize,
    /// Log every N global steps.
    pub log_interval: usize,
}

impl Default for UnlearnTrainConfig {
    fn default() -> Self {
        Self { epochs: 3, max_steps: None, gradient_accumulation_steps: 1, log_interval: 10 }
    }
}

/// Resolved length of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    /// Steps per epoch across both streams.
    pub steps_per_epoch: usize,
    /// Total steps; the ratio schedule is laid out over this.
    pub max_steps: usize,
    /// Epochs needed to reach `max_steps`.
    pub epochs: usize,
}

impl UnlearnTrainConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of epochs.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set an explicit step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Set gradient accumulation steps.
    pub fn with_gradient_accumulation_steps(mut self, steps: usize) -> Self {
        self.gradient_accumulation_steps = steps.max(1);
        self
    }

    /// Set the logging interval.
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.gradient_accumulation_steps == 0 {
            return Err(Error::Config("gradient_accumulation_steps must be > 0".to_string()));
        }
        if self.max_steps == Some(0) {
            return Err(Error::InvalidSchedule("max_steps must be > 0".to_string()));
        }
        if self.max_steps.is_none() && self.epochs == 0 {
            return Err(Error::Config("epochs must be > 0 when max_steps is unset".to_string()));
        }
        Ok(())
    }

    /// Work out how long the run is for the given batch counts.
    ///
    /// An explicit `max_steps` wins and sets the epoch count; otherwise
    /// `max_steps = epochs × steps_per_epoch`.
    pub fn plan(&self, forget_batches: usize, retain_batches: usize) -> Result<StepPlan> {
        self.validate()?;
        let accum = self.gradient_accumulation_steps.max(1);
        let steps_per_epoch = ((forget_batches + retain_batches) / accum).max(1);
        let (max_steps, epochs) = match self.max_steps {
            Some(max_steps) => (max_steps, max_steps.div_ceil(steps_per_epoch)),
            None => (self.epochs * steps_per_epoch, self.epochs),
        };
        Ok(StepPlan { steps_per_epoch, max_steps, epochs })
    }
}
