//! Two-pass unlearning training loop
//!
//! Reference driver for [`UnlearningPruner`](crate::prune::UnlearningPruner).
//! Each epoch runs the forget batches first, which only feed forget-side
//! sensitivity, then the retain batches, which feed retain-side sensitivity,
//! may prune, and step the optimizer and learning-rate scheduler:
//!
//! ```text
//! epoch: [forget b0 .. bN] → [retain b0 .. bM]
//!          sensitivity         sensitivity + prune + optimizer
//! ```
//!
//! The model, loss and optimizer live behind [`TrainingBackend`].

mod backend;
mod config;
mod history;
mod synthetic;
mod two_pass;


pub use backend::TrainingBackend;
pub use config::{StepPlan, UnlearnTrainConfig};
pub use history::TrainingHistory;
pub use synthetic::{SyntheticBackend, SyntheticConfig};
pub use two_pass::{TrainOutput, UnlearningTrainer};
