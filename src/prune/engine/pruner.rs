//! Engine facade.

use super::report::StepReport;
use crate::error::Result;
use crate::model::ParameterStore;
use crate::prune::applicator::{PruningApplicator, PruningDecision, PruningState};
use crate::prune::config::UnlearnPruneConfig;
use crate::prune::dual::{DualSensitivity, DualSensitivityCombiner};
use crate::prune::schedule::RatioSchedule;
use crate::prune::sensitivity::{DataStream, SensitivityDict, SensitivityTracker};

/// Sensitivity-guided pruning for machine unlearning.
///
/// Owns one tracker per data stream and the sticky pruning state. Forget
/// steps only feed the forget tracker. Retain steps feed the retain tracker
/// and, on the pruning cadence, prune units that matter to the forget data
/// but not to the retain data.
///
/// # Example
///
/// ```
/// use ndarray::Array2;
/// use olvidar::model::{ModelParameters, ParameterGroup};
/// use olvidar::prune::{DataStream, UnlearnPruneConfig, UnlearningPruner};
///
/// let mut model = ModelParameters::new();
/// model.insert("layer.0", ParameterGroup::new(Array2::ones((4, 4))));
///
/// let mut pruner = UnlearningPruner::new(UnlearnPruneConfig::default(), &model).unwrap();
/// let report = pruner.on_step(DataStream::Forget, &mut model, 0, 100).unwrap();
/// assert!(!report.runs_optimizer());
/// ```
#[derive(Debug, Clone)]
pub struct UnlearningPruner {
    config: UnlearnPruneConfig,
    forget: SensitivityTracker,
    retain: SensitivityTracker,
    combiner: DualSensitivityCombiner,
    applicator: PruningApplicator,
}

impl UnlearningPruner {
    /// Validate `config` and build zero-initialized state over `model`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchedule` or `Config` for an invalid configuration.
    pub fn new<M: ParameterStore + ?Sized>(config: UnlearnPruneConfig, model: &M) -> Result<Self> {
        config.validate()?;
        let tracker = |stream| {
            SensitivityTracker::new(stream, config.prune_metric(), config.granularity(), model)
                .with_outlier_clip(config.outlier_clip())
        };
        let forget = tracker(DataStream::Forget);
        let retain = tracker(DataStream::Retain);
        let combiner = DualSensitivityCombiner::new(config.eps(), config.normalization());
        let applicator = PruningApplicator::from_config(&config, model)?;

        tracing::info!(
            metric = %config.prune_metric(),
            ratio = config.ratio(),
            prune_freq = config.prune_freq(),
            groups = forget.sensitivity().len(),
            "unlearning pruner ready"
        );
        Ok(Self { config, forget, retain, combiner, applicator })
    }

    /// Engine configuration.
    pub fn config(&self) -> &UnlearnPruneConfig {
        &self.config
    }

    /// Enable gradients on every tracked weight when the metric needs them.
    ///
    /// Call once before training starts.
    pub fn prepare<M: ParameterStore + ?Sized>(&self, model: &mut M) {
        if !self.config.prune_metric().requires_base_grad() {
            return;
        }
        let names = model.group_names();
        for name in &names {
            model.set_requires_grad(name, true);
        }
        tracing::debug!(groups = names.len(), "unfroze base weights for grad metric");
    }

    /// Target ratio for `step` of `max_steps`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchedule` if `max_steps == 0`.
    pub fn scheduled_ratio(&self, step: usize, max_steps: usize) -> Result<f32> {
        let schedule = RatioSchedule::new(
            max_steps,
            self.config.warmup_iters(),
            self.config.cooldown_iters(),
            self.config.init_ratio(),
            self.config.ratio(),
        )?
        .with_shape(self.config.ramp());
        Ok(schedule.ratio_at(step))
    }

    /// Process one optimizer step of `stream`.
    ///
    /// Updates the stream's tracker from the model's current weights and
    /// gradients. On retain steps also runs the pruning decision.
    ///
    /// # Errors
    ///
    /// Propagates `InvalidSchedule`, `MissingGradient` and
    /// `InconsistentShapes`.
    pub fn on_step<M: ParameterStore + ?Sized>(
        &mut self,
        stream: DataStream,
        model: &mut M,
        step: usize,
        max_steps: usize,
    ) -> Result<StepReport> {
        let target_ratio = self.scheduled_ratio(step, max_steps)?;
        let sensitivity_updated = match stream {
            DataStream::Forget => self.forget.update(model)?,
            DataStream::Retain => self.retain.update(model)?,
        };
        let decision = match stream {
            DataStream::Forget => None,
            DataStream::Retain => Some(self.maybe_prune(model, target_ratio, step)?),
        };
        Ok(StepReport { step, stream, target_ratio, sensitivity_updated, decision })
    }

    /// Run the pruning decision for `step` at `target_ratio`.
    ///
    /// Dual scores are only built when the cadence and window gates pass.
    pub fn maybe_prune<M: ParameterStore + ?Sized>(
        &mut self,
        model: &mut M,
        target_ratio: f32,
        step: usize,
    ) -> Result<PruningDecision> {
        if let Some(reason) = self.applicator.gate(step, target_ratio) {
            return Ok(PruningDecision::skipped(
                step,
                reason,
                target_ratio,
                self.applicator.current_ratio(),
            ));
        }
        let dual = self.dual_sensitivity()?;
        self.applicator.maybe_prune(model, &dual, target_ratio, step)
    }

    /// Current dual scores.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentShapes` if the trackers disagree.
    pub fn dual_sensitivity(&self) -> Result<DualSensitivity> {
        self.combiner.combine_dicts(self.forget.sensitivity(), self.retain.sensitivity())
    }

    /// Forget-stream sensitivities.
    pub fn forget_sensitivity(&self) -> &SensitivityDict {
        self.forget.sensitivity()
    }

    /// Retain-stream sensitivities.
    pub fn retain_sensitivity(&self) -> &SensitivityDict {
        self.retain.sensitivity()
    }

    /// Sticky pruning masks.
    pub fn pruning_state(&self) -> &PruningState {
        self.applicator.state()
    }

    /// Achieved sparsity.
    pub fn achieved_ratio(&self) -> f32 {
        self.applicator.current_ratio()
    }

    /// Re-zero pruned units after the optimizer touched them.
    pub fn enforce_masks<M: ParameterStore + ?Sized>(&self, model: &mut M) {
        self.applicator.enforce_masks(model);
    }

    /// Install restored state. Callers go through `EngineCheckpoint::restore`.
    pub(crate) fn install(
        &mut self,
        forget: SensitivityDict,
        retain: SensitivityDict,
        pruning: PruningState,
    ) {
        self.forget.replace(forget);
        self.retain.replace(retain);
        self.applicator.replace_state(pruning);
    }
}
