//! Pruning decision and application
//!
//! The applicator owns the sticky [`PruningState`]. On pruning steps it ranks
//! every still-unpruned unit by dual score, keeps only units whose score
//! clears the unlearning threshold, and zeroes the top ones until the model
//! reaches the scheduled sparsity. Too few qualifying units is a reported
//! shortfall, never forced pruning.

mod apply;
mod decision;
mod state;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

pub use apply::PruningApplicator;
pub use decision::{PruningDecision, SkipReason};
pub use state::{GroupMask, PruningState};
