//! Dual sensitivity
//!
//! Folds the forget-stream and retain-stream sensitivities of each unit into
//! one score. A unit scores high when it matters to the forget data and low
//! when it matters to the retain data:
//!
//! ```text
//! score = forget_norm / (retain_norm + eps)
//! ```
//!
//! Both streams are first normalized across all groups so their raw scales
//! do not leak into the ratio.

mod combiner;
mod normalize;

#[cfg(test)]
mod proptests;

pub use combiner::{combine, DualSensitivity, DualSensitivityCombiner};
pub use normalize::{normalize, Normalization};
