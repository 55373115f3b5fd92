//! Olvidar: unlearning-aware structured pruning
//!
//! Olvidar removes the parameters a model relies on for data it should
//! forget while protecting the parameters it needs for data it must retain.
//! Training alternates a forget pass and a retain pass; each pass feeds its
//! own [`prune::SensitivityTracker`], and on retain steps the
//! [`prune::PruningApplicator`] zeroes the units with the highest
//! forget-to-retain sensitivity until the sparsity scheduled by the
//! [`prune::RatioSchedule`] is reached.
//!
//! # Modules
//!
//! - [`model`]: parameter groups, LoRA factors and the `ParameterStore` seam
//! - [`prune`]: sensitivity tracking, ratio schedule, dual scoring, pruning
//! - [`train`]: two-pass unlearning loop over a `TrainingBackend`
//! - [`config`]: YAML configuration and validation
//! - [`cli`]: the `olvidar` binary's commands
//!
//! # Example
//!
//! ```
//! use ndarray::Array2;
//! use olvidar::model::{ModelParameters, ParameterGroup};
//! use olvidar::prune::{DataStream, UnlearnPruneConfig, UnlearningPruner};
//!
//! let mut model = ModelParameters::new();
//! model.insert("proj", ParameterGroup::new(Array2::ones((4, 4))));
//!
//! let pruner = UnlearningPruner::new(UnlearnPruneConfig::default(), &model)?;
//! assert_eq!(pruner.achieved_ratio(), 0.0);
//! # Ok::<(), olvidar::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod prune;
pub mod train;

pub use error::{Error, Result};
