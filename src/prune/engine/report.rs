//! Per-step engine report.

use serde::{Deserialize, Serialize};

use crate::prune::applicator::PruningDecision;
use crate::prune::sensitivity::DataStream;

/// What the engine did on one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Global step.
    pub step: usize,
    /// Stream that produced the step.
    pub stream: DataStream,
    /// Scheduled sparsity for this step.
    pub target_ratio: f32,
    /// False when the update was skipped for non-finite importance.
    pub sensitivity_updated: bool,
    /// Pruning outcome. Present on retain steps only.
    pub decision: Option<PruningDecision>,
}

impl StepReport {
    /// Whether the loop should run the optimizer and LR scheduler.
    ///
    /// Forget steps exist only to feed forget-side sensitivity.
    pub fn runs_optimizer(&self) -> bool {
        self.stream == DataStream::Retain
    }

    /// Check if this step pruned at least one unit.
    pub fn pruned(&self) -> bool {
        self.decision.as_ref().is_some_and(|d| !d.is_noop())
    }
}
