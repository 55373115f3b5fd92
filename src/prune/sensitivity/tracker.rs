//! Streaming sensitivity tracker.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::importance::compute_importance;
use super::value::SensitivityDict;
use crate::error::{Error, Result};
use crate::model::ParameterStore;
use crate::prune::config::{Granularity, PruneMetric};

/// Which data stream produced the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStream {
    /// Data the model should forget. Feeds sensitivity only.
    Forget,
    /// Data the model must keep performing on.
    Retain,
}

impl fmt::Display for DataStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStream::Forget => f.write_str("forget"),
            DataStream::Retain => f.write_str("retain"),
        }
    }
}

/// Running importance estimate for one data stream.
///
/// Created once per run, zero-initialized over every group of the model, and
/// updated once per optimizer step of its stream.
#[derive(Debug, Clone)]
pub struct SensitivityTracker {
    stream: DataStream,
    metric: PruneMetric,
    granularity: Granularity,
    outlier_clip: Option<f64>,
    dict: SensitivityDict,
}

impl SensitivityTracker {
    /// Create a zero-initialized tracker covering the model's groups.
    pub fn new<M: ParameterStore + ?Sized>(
        stream: DataStream,
        metric: PruneMetric,
        granularity: Granularity,
        model: &M,
    ) -> Self {
        Self {
            stream,
            metric,
            granularity,
            outlier_clip: None,
            dict: SensitivityDict::zeros_for(model, granularity),
        }
    }

    /// Cap each step's contribution at `clip ×` the group's running mean.
    pub fn with_outlier_clip(mut self, clip: Option<f64>) -> Self {
        self.outlier_clip = clip;
        self
    }

    /// Stream this tracker is fed from.
    pub fn stream(&self) -> DataStream {
        self.stream
    }

    /// Importance metric.
    pub fn metric(&self) -> PruneMetric {
        self.metric
    }

    /// Pruning granularity.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Current accumulated sensitivities.
    pub fn sensitivity(&self) -> &SensitivityDict {
        &self.dict
    }

    /// Replace the accumulated sensitivities (checkpoint restore).
    pub(crate) fn replace(&mut self, dict: SensitivityDict) {
        self.dict = dict;
    }

    /// Reset every value to zero, keeping the tracked groups.
    pub fn reset<M: ParameterStore + ?Sized>(&mut self, model: &M) {
        self.dict = SensitivityDict::zeros_for(model, self.granularity);
    }

    /// Fold the model's current state into the running sensitivities.
    ///
    /// The update is all-or-nothing: contributions for every group are
    /// computed first, and if any of them is non-finite (a NaN/inf loss
    /// spike) the whole step is skipped and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// - `MissingGradient` when the `grad` metric finds a group without one
    /// - `InconsistentShapes` when the model's groups changed since creation
    pub fn update<M: ParameterStore + ?Sized>(&mut self, model: &M) -> Result<bool> {
        self.dict.check_against(model, self.granularity)?;

        let mut contributions: Vec<(String, Array1<f64>)> = Vec::with_capacity(self.dict.len());
        for name in model.group_names() {
            let view = model
                .group(&name)
                .ok_or_else(|| Error::shapes(format!("group '{name}' vanished from model")))?;
            let contribution = compute_importance(&name, &view, self.metric, self.granularity)?;
            if contribution.iter().any(|v| !v.is_finite()) {
                tracing::warn!(
                    stream = %self.stream,
                    group = %name,
                    "non-finite importance, skipping sensitivity update"
                );
                return Ok(false);
            }
            contributions.push((name, contribution));
        }

        for (name, contribution) in &contributions {
            if let Some(value) = self.dict.get_mut(name) {
                value.accumulate(contribution, self.outlier_clip)?;
            }
        }

        tracing::debug!(
            stream = %self.stream,
            metric = %self.metric,
            groups = contributions.len(),
            "sensitivity updated"
        );
        Ok(true)
    }
}
