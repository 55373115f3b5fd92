//! Configuration validation logic

use super::error::ValidationError;
use crate::config::schema::UnlearnSpec;

/// Validate a run configuration
///
/// Checks:
/// - Ratios and schedule fractions are in range
/// - Cadence and accumulation are non-zero
/// - The run has a length
/// - The synthetic model is non-empty
pub fn validate_config(spec: &UnlearnSpec) -> Result<(), ValidationError> {
    let pruning = &spec.pruning;

    if !(0.0..=1.0).contains(&pruning.ratio()) {
        return Err(ValidationError::InvalidRatio(pruning.ratio()));
    }
    if !(0.0..=pruning.ratio()).contains(&pruning.init_ratio()) {
        return Err(ValidationError::InvalidInitRatio {
            init: pruning.init_ratio(),
            ratio: pruning.ratio(),
        });
    }
    for (name, value) in [
        ("warmup_iters", pruning.warmup_iters()),
        ("cooldown_iters", pruning.cooldown_iters()),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::InvalidFraction { name, value });
        }
    }
    if pruning.prune_freq() == 0 {
        return Err(ValidationError::InvalidPruneFreq(0));
    }
    if !pruning.unlearning_threshold().is_finite() {
        return Err(ValidationError::InvalidThreshold(pruning.unlearning_threshold()));
    }
    if !(0.0..=1.0).contains(&pruning.min_retain_performance()) {
        return Err(ValidationError::InvalidMinRetainPerformance(pruning.min_retain_performance()));
    }
    if !(pruning.eps().is_finite() && pruning.eps() > 0.0) {
        return Err(ValidationError::InvalidEps(pruning.eps()));
    }
    if let Some(clip) = pruning.outlier_clip() {
        if !(clip.is_finite() && clip > 0.0) {
            return Err(ValidationError::InvalidOutlierClip(clip));
        }
    }

    let training = &spec.training;
    if training.gradient_accumulation_steps == 0 {
        return Err(ValidationError::InvalidAccumulation(0));
    }
    match training.max_steps {
        Some(0) => return Err(ValidationError::InvalidMaxSteps),
        None if training.epochs == 0 => return Err(ValidationError::InvalidEpochs(0)),
        _ => {}
    }

    let model = &spec.model;
    if model.groups == 0 || model.d_out == 0 || model.d_in == 0 {
        return Err(ValidationError::InvalidModelShape {
            groups: model.groups,
            d_out: model.d_out,
            d_in: model.d_in,
        });
    }
    if !(0.0..=1.0).contains(&model.forget_fraction) {
        return Err(ValidationError::InvalidForgetFraction(model.forget_fraction));
    }
    if !(model.learning_rate > 0.0 && model.learning_rate <= 1.0) {
        return Err(ValidationError::InvalidLearningRate(model.learning_rate));
    }
    if model.retain_batches == 0 {
        return Err(ValidationError::NoRetainBatches);
    }

    Ok(())
}
