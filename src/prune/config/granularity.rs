//! Pruning granularity.

use serde::{Deserialize, Serialize};

/// Unit of pruning inside a `[d_out, d_in]` weight matrix.
///
/// Sensitivities, dual scores and masks all hold one value per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Individual weights (unstructured).
    Element,

    /// Entire output rows (structured channel pruning).
    #[default]
    Channel,
}

impl Granularity {
    /// Number of prunable units in a weight of the given shape.
    pub fn unit_count(&self, (d_out, d_in): (usize, usize)) -> usize {
        match self {
            Granularity::Element => d_out * d_in,
            Granularity::Channel => d_out,
        }
    }

    /// Number of weights covered by one unit.
    pub fn unit_size(&self, (_, d_in): (usize, usize)) -> usize {
        match self {
            Granularity::Element => 1,
            Granularity::Channel => d_in,
        }
    }

    /// Check if whole rows are pruned together.
    pub fn is_structured(&self) -> bool {
        matches!(self, Granularity::Channel)
    }
}
