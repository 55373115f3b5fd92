//! Accumulated sensitivity values.

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ParameterStore;
use crate::prune::config::Granularity;

/// Accumulated importance for one parameter group under one stream.
///
/// Holds one score per prunable unit. Scores only ever grow: every update
/// adds a non-negative contribution with saturating addition, so the value
/// survives any number of updates without overflowing to infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityValue {
    /// Running score per unit.
    scores: Array1<f64>,
    /// Number of applied updates.
    updates: u64,
    /// Sum of every contribution ever added (all units).
    total: f64,
}

impl SensitivityValue {
    /// Zero-initialized value for `units` prunable units.
    pub fn zeros(units: usize) -> Self {
        Self { scores: Array1::zeros(units), updates: 0, total: 0.0 }
    }

    /// Build a value from existing scores (treated as one update).
    ///
    /// Negative or non-finite entries are clamped into `[0, f64::MAX]`.
    pub fn from_scores(scores: Array1<f64>) -> Self {
        let scores = scores.mapv(sanitize);
        let total = scores.iter().fold(0.0, |acc, &v| saturating_add(acc, v));
        let updates = u64::from(total > 0.0);
        Self { scores, updates, total }
    }

    /// Per-unit scores.
    pub fn scores(&self) -> &Array1<f64> {
        &self.scores
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check if the value covers zero units.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of applied updates.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Sum of all contributions so far.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Mean contribution per unit per update.
    pub fn mean_unit_contribution(&self) -> f64 {
        if self.updates == 0 || self.scores.is_empty() {
            return 0.0;
        }
        self.total / (self.updates as f64 * self.scores.len() as f64)
    }

    /// Add a contribution.
    ///
    /// When `outlier_clip` is set and this value already has history, each
    /// unit's contribution is capped at `clip ×` its own running mean. Units
    /// whose running mean is below the group's mean per-unit contribution are
    /// capped against the group mean instead, so a unit with no history yet is
    /// not frozen at zero.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentShapes` if the contribution length differs.
    pub fn accumulate(&mut self, contribution: &Array1<f64>, outlier_clip: Option<f64>) -> Result<()> {
        if contribution.len() != self.scores.len() {
            return Err(Error::shapes(format!(
                "contribution has {} units, sensitivity has {}",
                contribution.len(),
                self.scores.len()
            )));
        }

        let clip = outlier_clip.filter(|_| self.total > 0.0 && self.updates > 0);
        let group_mean = self.mean_unit_contribution();
        let updates = self.updates as f64;

        let mut step_total = 0.0;
        for (score, &c) in self.scores.iter_mut().zip(contribution.iter()) {
            let cap = match clip {
                Some(clip) => clip * (*score / updates).max(group_mean),
                None => f64::MAX,
            };
            let c = sanitize(c).min(cap);
            *score = saturating_add(*score, c);
            step_total = saturating_add(step_total, c);
        }
        self.total = saturating_add(self.total, step_total);
        self.updates = self.updates.saturating_add(1);
        Ok(())
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, f64::MAX)
    }
}

fn saturating_add(a: f64, b: f64) -> f64 {
    (a + b).min(f64::MAX)
}

/// Sensitivity values keyed by parameter-group name.
///
/// The forget and retain streams each own one dict. They are never merged in
/// place; combination goes through the dual-sensitivity combiner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityDict {
    values: BTreeMap<String, SensitivityValue>,
}

impl SensitivityDict {
    /// Create an empty dict.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-initialized dict covering every group of a model.
    pub fn zeros_for<M: ParameterStore + ?Sized>(model: &M, granularity: Granularity) -> Self {
        let values = model
            .group_names()
            .into_iter()
            .filter_map(|name| {
                let units = granularity.unit_count(model.group(&name)?.shape());
                Some((name, SensitivityValue::zeros(units)))
            })
            .collect();
        Self { values }
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: SensitivityValue) {
        self.values.insert(name.into(), value);
    }

    /// Get a group's value.
    pub fn get(&self, name: &str) -> Option<&SensitivityValue> {
        self.values.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut SensitivityValue> {
        self.values.get_mut(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SensitivityValue)> {
        self.values.iter()
    }

    /// Group names in order.
    pub fn names(&self) -> Vec<&String> {
        self.values.keys().collect()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no groups are tracked.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total number of units across groups.
    pub fn total_units(&self) -> usize {
        self.values.values().map(SensitivityValue::len).sum()
    }

    /// Check that this dict covers exactly the model's groups and unit counts.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentShapes` on the first mismatch.
    pub fn check_against<M: ParameterStore + ?Sized>(
        &self,
        model: &M,
        granularity: Granularity,
    ) -> Result<()> {
        let names = model.group_names();
        if names.len() != self.values.len() {
            return Err(Error::shapes(format!(
                "model has {} groups, sensitivity tracks {}",
                names.len(),
                self.values.len()
            )));
        }
        for name in &names {
            let value = self
                .values
                .get(name)
                .ok_or_else(|| Error::shapes(format!("group '{name}' is not tracked")))?;
            let view = model
                .group(name)
                .ok_or_else(|| Error::shapes(format!("group '{name}' vanished from model")))?;
            let units = granularity.unit_count(view.shape());
            if units != value.len() {
                return Err(Error::shapes(format!(
                    "group '{name}' has {units} units, sensitivity has {}",
                    value.len()
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, SensitivityValue)> for SensitivityDict {
    fn from_iter<I: IntoIterator<Item = (String, SensitivityValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
