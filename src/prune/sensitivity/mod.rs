//! Per-group sensitivity tracking
//!
//! Each data stream (forget or retain) owns one [`SensitivityTracker`]. At
//! every optimizer step of its stream the tracker computes a non-negative
//! importance contribution per prunable unit and adds it to a running,
//! saturating sum.
//!
//! - `lora` metric: `|G_eff ⊙ W_eff|` from the adapter factors
//! - `grad` metric: `|W ⊙ ∂W|` from base-weight gradients
//!
//! # References
//! - Molchanov, P., et al. (2019). Importance estimation for neural network
//!   pruning. CVPR.
//! - Zhang, M., et al. (2024). LoRAPrune. arXiv:2305.18403.

mod importance;
mod tracker;
mod value;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

pub use importance::compute_importance;
pub use tracker::{DataStream, SensitivityTracker};
pub use value::{SensitivityDict, SensitivityValue};
