//! Validation error types

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid ratio: {0} (must be in [0.0, 1.0])")]
    InvalidRatio(f32),

    #[error("Invalid init_ratio: {init} (must be in [0.0, ratio = {ratio}])")]
    InvalidInitRatio { init: f32, ratio: f32 },

    #[error("Invalid {name}: {value} (must be a fraction in [0.0, 1.0])")]
    InvalidFraction { name: &'static str, value: f32 },

    #[error("Invalid prune_freq: {0} (must be > 0)")]
    InvalidPruneFreq(usize),

    #[error("Invalid unlearning_threshold: {0} (must be finite)")]
    InvalidThreshold(f32),

    #[error("Invalid min_retain_performance: {0} (must be in [0.0, 1.0])")]
    InvalidMinRetainPerformance(f32),

    #[error("Invalid eps: {0} (must be > 0.0)")]
    InvalidEps(f64),

    #[error("Invalid outlier_clip: {0} (must be > 0.0)")]
    InvalidOutlierClip(f64),

    #[error("Invalid epochs: {0} (must be > 0 when max_steps is unset)")]
    InvalidEpochs(usize),

    #[error("Invalid max_steps: 0 (must be > 0)")]
    InvalidMaxSteps,

    #[error("Invalid gradient_accumulation_steps: {0} (must be > 0)")]
    InvalidAccumulation(usize),

    #[error("Invalid model shape: {groups} groups of {d_out}x{d_in} (all must be > 0)")]
    InvalidModelShape { groups: usize, d_out: usize, d_in: usize },

    #[error("Invalid forget_fraction: {0} (must be in [0.0, 1.0])")]
    InvalidForgetFraction(f32),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid retain_batches: 0 (must be > 0)")]
    NoRetainBatches,
}
