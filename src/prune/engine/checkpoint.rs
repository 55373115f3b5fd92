//! Engine state persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::pruner::UnlearningPruner;
use crate::error::{Error, Result};
use crate::model::ParameterStore;
use crate::prune::applicator::PruningState;
use crate::prune::config::{Granularity, PruneMetric};
use crate::prune::sensitivity::SensitivityDict;

/// Snapshot of everything a resumed run needs to make the same pruning
/// decisions as an uninterrupted one.
///
/// Both sensitivity dicts and the masks are stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineCheckpoint {
    /// Format version
    pub version: String,
    /// Metric the sensitivities were accumulated with.
    pub metric: PruneMetric,
    /// Granularity of sensitivities and masks.
    pub granularity: Granularity,
    /// Forget-stream sensitivities.
    pub forget: SensitivityDict,
    /// Retain-stream sensitivities.
    pub retain: SensitivityDict,
    /// Sticky masks.
    pub pruning: PruningState,
}

impl EngineCheckpoint {
    /// Current format version.
    pub const VERSION: &'static str = "1.0";

    /// Capture the pruner's state.
    pub fn capture(pruner: &UnlearningPruner) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            metric: pruner.config().prune_metric(),
            granularity: pruner.config().granularity(),
            forget: pruner.forget_sensitivity().clone(),
            retain: pruner.retain_sensitivity().clone(),
            pruning: pruner.pruning_state().clone(),
        }
    }

    /// Save as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        tracing::info!(path = %path.display(), pruned = self.pruning.pruned_units(), "engine checkpoint saved");
        Ok(())
    }

    /// Load from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Io`, `Serialization`, or `Config` for an unsupported version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let checkpoint: Self = serde_json::from_reader(BufReader::new(file))?;
        if checkpoint.version != Self::VERSION {
            return Err(Error::Config(format!(
                "unsupported checkpoint version: {} (expected {})",
                checkpoint.version,
                Self::VERSION
            )));
        }
        Ok(checkpoint)
    }

    /// Install this state into `pruner` and re-apply the masks to `model`.
    ///
    /// # Errors
    ///
    /// - `Config` if the checkpoint was taken with another metric or
    ///   granularity
    /// - `InconsistentShapes` if it does not match the model's groups
    pub fn restore<M: ParameterStore + ?Sized>(
        self,
        pruner: &mut UnlearningPruner,
        model: &mut M,
    ) -> Result<()> {
        let config = pruner.config();
        if self.metric != config.prune_metric() || self.granularity != config.granularity() {
            return Err(Error::Config(format!(
                "checkpoint uses metric {} with {:?} granularity, pruner uses {} with {:?}",
                self.metric,
                self.granularity,
                config.prune_metric(),
                config.granularity()
            )));
        }
        self.forget.check_against(model, self.granularity)?;
        self.retain.check_against(model, self.granularity)?;
        self.pruning.check_against(model)?;
        if self.pruning.granularity() != self.granularity {
            return Err(Error::shapes("pruning masks were built for another granularity"));
        }

        let pruned = self.pruning.pruned_units();
        pruner.install(self.forget, self.retain, self.pruning);
        pruner.enforce_masks(model);
        tracing::info!(pruned, achieved = pruner.achieved_ratio(), "engine state restored");
        Ok(())
    }
}
