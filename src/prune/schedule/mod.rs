//! Sparsity ratio schedule
//!
//! Maps training progress to the target sparsity ratio:
//! - Warmup: hold `init_ratio` while the model adapts to the task
//! - Ramp: rise monotonically from `init_ratio` to `final_ratio`
//! - Cooldown: hold `final_ratio` so the pruned model can stabilize
//!
//! # References
//! - Zhu, M., & Gupta, S. (2017). To prune, or not to prune: exploring the
//!   efficacy of pruning for model compression. arXiv:1710.01878.
//! - Zhang, M., et al. (2024). LoRAPrune: Structured pruning meets low-rank
//!   parameter-efficient fine-tuning. arXiv:2305.18403.

mod ramp;
mod ratio;

#[cfg(test)]
mod proptests;

pub use ramp::RampShape;
pub use ratio::{ratio_at, RatioSchedule};
