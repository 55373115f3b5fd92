//! Pruning decision record.

use serde::{Deserialize, Serialize};

/// Why a step did not attempt pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `step % prune_freq != 0`.
    Cadence,
    /// Scheduled ratio is outside the open window `(init_ratio, final_ratio)`.
    OutsideWindow,
    /// The model already meets the scheduled ratio.
    TargetMet,
}

/// Outcome of one `maybe_prune` call, consumed by the training loop's logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningDecision {
    /// Global step the decision was made at.
    pub step: usize,
    /// Whether selection ran.
    pub attempted: bool,
    /// Set when `attempted` is false.
    pub skip_reason: Option<SkipReason>,
    /// Scheduled ratio for this step.
    pub target_ratio: f32,
    /// Achieved sparsity before this decision.
    pub ratio_before: f32,
    /// Achieved sparsity after this decision.
    pub achieved_ratio: f32,
    /// Units newly pruned.
    pub units_pruned: usize,
    /// Weights newly pruned.
    pub params_pruned: usize,
    /// Groups with at least one newly pruned unit, in name order.
    pub groups_touched: Vec<String>,
    /// Unpruned units whose dual score did not clear the threshold.
    pub below_threshold: usize,
    /// Weights still missing to reach the target. Non-zero only when too few
    /// units cleared the threshold.
    pub shortfall: usize,
}

impl PruningDecision {
    /// A decision that changed nothing.
    pub fn skipped(step: usize, reason: SkipReason, target_ratio: f32, current_ratio: f32) -> Self {
        Self {
            step,
            attempted: false,
            skip_reason: Some(reason),
            target_ratio,
            ratio_before: current_ratio,
            achieved_ratio: current_ratio,
            units_pruned: 0,
            params_pruned: 0,
            groups_touched: Vec::new(),
            below_threshold: 0,
            shortfall: 0,
        }
    }

    /// Check if no unit was pruned.
    pub fn is_noop(&self) -> bool {
        self.units_pruned == 0
    }

    /// Check if the threshold left the model short of its target.
    pub fn has_shortfall(&self) -> bool {
        self.shortfall > 0
    }
}
