//! Loss and pruning histories.

use serde::{Deserialize, Serialize};

use crate::prune::{DataStream, PruningDecision};

/// Per-stream loss curves and every attempted pruning decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Forget-batch losses.
    pub forget_loss: Vec<f32>,
    /// Retain-batch losses.
    pub retain_loss: Vec<f32>,
    /// Pruning decisions that ran selection.
    pub pruning: Vec<PruningDecision>,
    /// Losses replaced because they were NaN or infinite.
    pub filtered_losses: usize,
}

impl TrainingHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch loss.
    ///
    /// NaN and infinite losses are replaced by the stream's running mean so a
    /// single bad batch does not poison the curve.
    pub fn record_loss(&mut self, stream: DataStream, loss: f32) -> f32 {
        let history = match stream {
            DataStream::Forget => &mut self.forget_loss,
            DataStream::Retain => &mut self.retain_loss,
        };
        let value = if loss.is_finite() {
            loss
        } else {
            self.filtered_losses += 1;
            mean(history)
        };
        history.push(value);
        value
    }

    /// Record a pruning decision.
    pub fn record_decision(&mut self, decision: PruningDecision) {
        self.pruning.push(decision);
    }

    /// Mean loss of a stream.
    pub fn mean_loss(&self, stream: DataStream) -> f32 {
        match stream {
            DataStream::Forget => mean(&self.forget_loss),
            DataStream::Retain => mean(&self.retain_loss),
        }
    }

    /// Loss of the most recent batch of a stream.
    pub fn last_loss(&self, stream: DataStream) -> Option<f32> {
        match stream {
            DataStream::Forget => self.forget_loss.last().copied(),
            DataStream::Retain => self.retain_loss.last().copied(),
        }
    }

    /// Units pruned over the whole run.
    pub fn units_pruned(&self) -> usize {
        self.pruning.iter().map(|d| d.units_pruned).sum()
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}
