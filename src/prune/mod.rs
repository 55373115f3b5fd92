//! Sensitivity-guided pruning for machine unlearning
//!
//! Removes the parameters a model uses for the data it should forget while
//! protecting the ones it needs for the data it must retain:
//!
//! - **Sensitivity tracking**: per-unit importance accumulated separately on
//!   the forget and retain streams
//! - **Ratio schedule**: warmup / ramp / cooldown target sparsity
//! - **Dual sensitivity**: `forget / (retain + eps)` after global normalization
//! - **Applicator**: threshold-gated, sticky pruning of the top-scoring units
//!
//! # Example
//!
//! ```
//! use ndarray::Array2;
//! use olvidar::model::{ModelParameters, ParameterGroup};
//! use olvidar::prune::{DataStream, UnlearnPruneConfig, UnlearningPruner};
//!
//! let mut model = ModelParameters::new();
//! model.insert("mlp.up", ParameterGroup::new(Array2::ones((8, 4))));
//!
//! let config = UnlearnPruneConfig::default().with_prune_freq(1);
//! let mut pruner = UnlearningPruner::new(config, &model).unwrap();
//! for step in 0..10 {
//!     let stream = if step % 2 == 0 { DataStream::Forget } else { DataStream::Retain };
//!     let report = pruner.on_step(stream, &mut model, step, 10).unwrap();
//!     if report.runs_optimizer() {
//!         // optimizer.step(); scheduler.step();
//!         pruner.enforce_masks(&mut model);
//!     }
//! }
//! ```
//!
//! # References
//!
//! - Zhang, M., et al. (2024). LoRAPrune: Structured pruning meets low-rank
//!   parameter-efficient fine-tuning. arXiv:2305.18403.
//! - Zhu, M., & Gupta, S. (2017). To prune, or not to prune. arXiv:1710.01878.

mod applicator;
mod config;
mod dual;
mod engine;
mod schedule;
mod sensitivity;

pub use applicator::{GroupMask, PruningApplicator, PruningDecision, PruningState, SkipReason};
pub use config::{Granularity, PruneMetric, UnlearnPruneConfig};
pub use dual::{combine, normalize, DualSensitivity, DualSensitivityCombiner, Normalization};
pub use engine::{EngineCheckpoint, StepReport, UnlearningPruner};
pub use schedule::{ratio_at, RampShape, RatioSchedule};
pub use sensitivity::{
    compute_importance, DataStream, SensitivityDict, SensitivityTracker, SensitivityValue,
};
