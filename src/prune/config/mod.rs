//! Pruning configuration module
//!
//! Provides the importance metric, pruning granularity and the engine
//! configuration with the defaults of the LoRA unlearning trainer.

mod granularity;
mod metric;
mod pruning_config;


// Re-export all public types
pub use granularity::Granularity;
pub use metric::PruneMetric;
pub use pruning_config::UnlearnPruneConfig;
