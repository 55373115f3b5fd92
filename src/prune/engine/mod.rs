//! Unlearning pruner
//!
//! Ties the two sensitivity trackers, the ratio schedule, the dual combiner
//! and the applicator together behind one per-step call. The training loop
//! calls [`UnlearningPruner::on_step`] after every backward pass and reads
//! the returned [`StepReport`] to decide whether to step the optimizer.

mod checkpoint;
mod pruner;
mod report;


pub use checkpoint::EngineCheckpoint;
pub use pruner::UnlearningPruner;
pub use report::StepReport;
