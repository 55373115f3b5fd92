//! Two-pass epoch loop.

use std::time::Instant;

use super::backend::TrainingBackend;
use super::config::{StepPlan, UnlearnTrainConfig};
use super::history::TrainingHistory;
use crate::error::Result;
use crate::prune::{DataStream, UnlearningPruner};

/// Result of an unlearning run.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    /// Steps taken.
    pub global_step: usize,
    /// Step budget the ratio schedule was laid out over.
    pub max_steps: usize,
    /// Epochs started.
    pub epochs: usize,
    /// Mean retain loss.
    pub train_loss: f32,
    /// Mean forget loss.
    pub forget_loss: f32,
    /// Final achieved sparsity.
    pub achieved_ratio: f32,
    /// Wall time in seconds.
    pub elapsed_secs: f64,
}

/// Drives a [`TrainingBackend`] through forget and retain passes while the
/// [`UnlearningPruner`] tracks sensitivity and prunes.
#[derive(Debug)]
pub struct UnlearningTrainer {
    pruner: UnlearningPruner,
    config: UnlearnTrainConfig,
    history: TrainingHistory,
    global_step: usize,
    batches_seen: usize,
}

impl UnlearningTrainer {
    /// Create a trainer around a ready pruner.
    pub fn new(pruner: UnlearningPruner, config: UnlearnTrainConfig) -> Self {
        Self { pruner, config, history: TrainingHistory::new(), global_step: 0, batches_seen: 0 }
    }

    /// The pruner.
    pub fn pruner(&self) -> &UnlearningPruner {
        &self.pruner
    }

    /// Mutable pruner access (checkpoint restore).
    pub fn pruner_mut(&mut self) -> &mut UnlearningPruner {
        &mut self.pruner
    }

    /// Loss and pruning histories.
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Steps taken so far.
    pub fn global_step(&self) -> usize {
        self.global_step
    }

    /// Check a retain-set evaluation score against `min_retain_performance`.
    ///
    /// `score` is the retain metric relative to the pre-unlearning baseline.
    pub fn retain_performance_ok(&self, score: f32) -> bool {
        score >= self.pruner.config().min_retain_performance()
    }

    /// Run training to completion.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors and engine errors from the pruner.
    pub fn train<B: TrainingBackend>(&mut self, backend: &mut B) -> Result<TrainOutput> {
        let start = Instant::now();
        let plan = self
            .config
            .plan(backend.num_batches(DataStream::Forget), backend.num_batches(DataStream::Retain))?;
        tracing::info!(
            max_steps = plan.max_steps,
            epochs = plan.epochs,
            steps_per_epoch = plan.steps_per_epoch,
            accumulation = self.config.gradient_accumulation_steps,
            "starting unlearning run"
        );

        self.pruner.prepare(backend.model_mut());
        backend.zero_grad();

        let mut epochs = 0;
        while epochs < plan.epochs && self.global_step < plan.max_steps {
            epochs += 1;
            for stream in [DataStream::Forget, DataStream::Retain] {
                self.run_pass(backend, stream, &plan)?;
                if self.global_step >= plan.max_steps {
                    break;
                }
            }
            tracing::info!(
                epoch = epochs,
                step = self.global_step,
                forget_loss = self.history.mean_loss(DataStream::Forget),
                retain_loss = self.history.mean_loss(DataStream::Retain),
                sparsity = self.pruner.achieved_ratio(),
                "epoch finished"
            );
        }

        Ok(TrainOutput {
            global_step: self.global_step,
            max_steps: plan.max_steps,
            epochs,
            train_loss: self.history.mean_loss(DataStream::Retain),
            forget_loss: self.history.mean_loss(DataStream::Forget),
            achieved_ratio: self.pruner.achieved_ratio(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// One pass over the batches of `stream`.
    fn run_pass<B: TrainingBackend>(
        &mut self,
        backend: &mut B,
        stream: DataStream,
        plan: &StepPlan,
    ) -> Result<()> {
        let accum = self.config.gradient_accumulation_steps.max(1);
        let steps_in_epoch = backend.num_batches(stream);

        for index in 0..steps_in_epoch {
            let loss = backend.backward(stream, index);
            self.history.record_loss(stream, loss);
            self.batches_seen += 1;

            // Short passes still step on their last batch.
            let boundary = self.batches_seen % accum == 0
                || (steps_in_epoch <= accum && index + 1 == steps_in_epoch);
            if !boundary {
                continue;
            }

            let report =
                self.pruner.on_step(stream, backend.model_mut(), self.global_step, plan.max_steps)?;
            if report.runs_optimizer() {
                backend.optimizer_step();
                self.pruner.enforce_masks(backend.model_mut());
                backend.scheduler_step();
            }
            if let Some(decision) = report.decision {
                if decision.attempted {
                    self.history.record_decision(decision);
                }
            }
            backend.zero_grad();
            self.global_step += 1;

            if self.global_step % self.config.log_interval.max(1) == 0 {
                tracing::debug!(
                    step = self.global_step,
                    %stream,
                    loss = self.history.last_loss(stream).unwrap_or(0.0),
                    target_ratio = report.target_ratio,
                    "step"
                );
            }
            if self.global_step >= plan.max_steps {
                break;
            }
        }
        Ok(())
    }
}
