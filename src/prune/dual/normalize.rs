//! Cross-group normalization of sensitivity dicts.

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::prune::sensitivity::SensitivityDict;

/// Normalization applied to one stream before combination.
///
/// Statistics are taken over every unit of every group, so all normalized
/// values share one `[0, 1]` scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide by the global maximum. Zero stays zero.
    #[default]
    Max,

    /// `(v - min) / (max - min)`. A constant stream maps to all zeros.
    MinMax,

    /// Average rank of each value divided by `n - 1`.
    Rank,
}

/// Normalize every value of a dict with global statistics.
pub fn normalize(dict: &SensitivityDict, method: Normalization) -> BTreeMap<String, Array1<f64>> {
    let all: Vec<f64> = dict.iter().flat_map(|(_, v)| v.scores().iter().copied()).collect();
    if all.is_empty() {
        return dict.iter().map(|(name, v)| (name.clone(), Array1::zeros(v.len()))).collect();
    }

    let max = all.iter().copied().fold(f64::MIN, f64::max);
    let min = all.iter().copied().fold(f64::MAX, f64::min);

    match method {
        Normalization::Max => map_values(dict, |v| if max > 0.0 { v / max } else { 0.0 }),
        Normalization::MinMax => {
            let range = max - min;
            map_values(dict, |v| if range > 0.0 { (v - min) / range } else { 0.0 })
        }
        Normalization::Rank => rank_normalize(dict, &all),
    }
}

fn map_values(dict: &SensitivityDict, f: impl Fn(f64) -> f64) -> BTreeMap<String, Array1<f64>> {
    dict.iter().map(|(name, v)| (name.clone(), v.scores().mapv(&f))).collect()
}

fn rank_normalize(dict: &SensitivityDict, all: &[f64]) -> BTreeMap<String, Array1<f64>> {
    let mut sorted = all.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let denom = (n.saturating_sub(1)).max(1) as f64;

    // Average rank of the tie block containing `v`.
    let rank_of = |v: f64| -> f64 {
        let lo = sorted.partition_point(|&x| x < v);
        let hi = sorted.partition_point(|&x| x <= v);
        if hi == 0 {
            return 0.0;
        }
        (lo + hi - 1) as f64 / 2.0
    };

    if n == 1 {
        return map_values(dict, |v| if v > 0.0 { 1.0 } else { 0.0 });
    }
    map_values(dict, |v| rank_of(v) / denom)
}
