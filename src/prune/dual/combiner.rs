//! Dual-sensitivity combination.

use std::collections::BTreeMap;

use ndarray::Array1;

use super::normalize::{normalize, Normalization};
use crate::error::{Error, Result};
use crate::prune::sensitivity::SensitivityDict;

/// Combine one forget value and one retain value into a dual score.
///
/// `forget / (retain + eps)`: non-decreasing in `forget`, non-increasing in
/// `retain`, and finite when `retain == 0` as long as `eps > 0`. Negative
/// inputs are treated as zero.
pub fn combine(forget: f64, retain: f64, eps: f64) -> f64 {
    let forget = if forget.is_nan() { 0.0 } else { forget.max(0.0) };
    let retain = if retain.is_nan() { 0.0 } else { retain.max(0.0) };
    (forget / (retain + eps)).min(f64::MAX)
}

/// Per-unit dual scores for every parameter group.
///
/// Transient: recomputed at each pruning decision and never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DualSensitivity {
    scores: BTreeMap<String, Array1<f64>>,
}

impl DualSensitivity {
    /// Get a group's scores.
    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.scores.get(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Array1<f64>)> {
        self.scores.iter()
    }

    /// Group names in order.
    pub fn names(&self) -> Vec<&String> {
        self.scores.keys().collect()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Highest score across all groups.
    pub fn max_score(&self) -> Option<f64> {
        self.scores.values().flat_map(|s| s.iter().copied()).reduce(f64::max)
    }
}

impl FromIterator<(String, Array1<f64>)> for DualSensitivity {
    fn from_iter<I: IntoIterator<Item = (String, Array1<f64>)>>(iter: I) -> Self {
        Self { scores: iter.into_iter().collect() }
    }
}

/// Builds [`DualSensitivity`] from the two stream dicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualSensitivityCombiner {
    eps: f64,
    normalization: Normalization,
}

impl Default for DualSensitivityCombiner {
    fn default() -> Self {
        Self { eps: 1e-8, normalization: Normalization::default() }
    }
}

impl DualSensitivityCombiner {
    /// Create a combiner.
    pub fn new(eps: f64, normalization: Normalization) -> Self {
        Self { eps, normalization }
    }

    /// Division guard.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Normalization applied to each stream.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Score a single pair of (already normalized) values.
    pub fn combine(&self, forget: f64, retain: f64) -> f64 {
        combine(forget, retain, self.eps)
    }

    /// Normalize both streams and combine them unit by unit.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentShapes` if the dicts track different groups or
    /// different unit counts for the same group.
    pub fn combine_dicts(
        &self,
        forget: &SensitivityDict,
        retain: &SensitivityDict,
    ) -> Result<DualSensitivity> {
        if forget.names() != retain.names() {
            return Err(Error::shapes(format!(
                "forget tracks {} groups and retain tracks {}, or their names differ",
                forget.len(),
                retain.len()
            )));
        }
        for (name, f) in forget.iter() {
            let r_len = retain.get(name).map_or(0, |r| r.len());
            if f.len() != r_len {
                return Err(Error::shapes(format!(
                    "group '{name}' has {} forget units and {r_len} retain units",
                    f.len()
                )));
            }
        }

        let forget_norm = normalize(forget, self.normalization);
        let retain_norm = normalize(retain, self.normalization);

        let scores = forget_norm
            .into_iter()
            .map(|(name, f)| {
                let dual = match retain_norm.get(&name) {
                    Some(r) => {
                        Array1::from_iter(f.iter().zip(r.iter()).map(|(&f, &r)| self.combine(f, r)))
                    }
                    None => Array1::zeros(f.len()),
                };
                (name, dual)
            })
            .collect();
        Ok(DualSensitivity { scores })
    }
}
