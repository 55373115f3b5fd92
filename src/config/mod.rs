//! YAML run configuration
//!
//! A run file bundles the pruning engine settings, the training loop settings
//! and the synthetic model used by `olvidar simulate`:
//!
//! ```yaml
//! pruning:
//!   ratio: 0.5
//!   prune_freq: 10
//!   prune_metric: lora
//!   unlearning_threshold: 0.1
//! training:
//!   epochs: 3
//!   gradient_accumulation_steps: 1
//! model:
//!   groups: 4
//!   d_out: 16
//!   d_in: 16
//! ```
//!
//! Every section and every field is optional and falls back to its default.

mod loader;
mod schema;
mod validate;


pub use loader::{load_config, parse_config};
pub use schema::UnlearnSpec;
pub use validate::{validate_config, ValidationError};
