//! Importance metric selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How per-parameter importance is estimated at each optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum PruneMetric {
    /// Importance from the LoRA adapter's effective contribution.
    /// Never needs gradients on the frozen base weights.
    #[default]
    Lora,

    /// Importance from `|W ⊙ ∂W|`.
    /// Base weights must be unfrozen before training starts.
    Grad,
}

impl PruneMetric {
    /// Check if this metric needs gradients on the base weights.
    pub fn requires_base_grad(&self) -> bool {
        matches!(self, PruneMetric::Grad)
    }

    /// Config-file name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            PruneMetric::Lora => "lora",
            PruneMetric::Grad => "grad",
        }
    }
}

impl fmt::Display for PruneMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PruneMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lora" => Ok(PruneMetric::Lora),
            "grad" => Ok(PruneMetric::Grad),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

impl TryFrom<String> for PruneMetric {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PruneMetric> for String {
    fn from(metric: PruneMetric) -> Self {
        metric.as_str().to_string()
    }
}
