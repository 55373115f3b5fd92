//! YAML schema of an unlearning run.

use serde::{Deserialize, Serialize};

use crate::prune::UnlearnPruneConfig;
use crate::train::{SyntheticConfig, UnlearnTrainConfig};

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnlearnSpec {
    /// Pruning engine settings.
    pub pruning: UnlearnPruneConfig,
    /// Training loop settings.
    pub training: UnlearnTrainConfig,
    /// Synthetic model for simulation.
    pub model: SyntheticConfig,
}

impl UnlearnSpec {
    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
