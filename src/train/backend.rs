//! Training backend seam.

use crate::model::ParameterStore;
use crate::prune::DataStream;

/// Model, loss and optimizer driven by [`UnlearningTrainer`](super::UnlearningTrainer).
///
/// The trainer decides *when* each call happens; the backend decides what it
/// means for its model.
pub trait TrainingBackend {
    /// Parameter storage the pruner reads and writes.
    type Model: ParameterStore;

    /// Number of batches of `stream` in one epoch.
    fn num_batches(&self, stream: DataStream) -> usize;

    /// Forward and backward pass on batch `index` of `stream`.
    ///
    /// Gradients add to whatever the previous calls left behind so gradient
    /// accumulation works. Returns the batch loss.
    fn backward(&mut self, stream: DataStream, index: usize) -> f32;

    /// Apply the accumulated gradients.
    fn optimizer_step(&mut self);

    /// Advance the learning-rate schedule.
    fn scheduler_step(&mut self) {}

    /// Drop accumulated gradients.
    fn zero_grad(&mut self);

    /// Live parameters.
    fn model(&self) -> &Self::Model;

    /// Live parameters, mutably.
    fn model_mut(&mut self) -> &mut Self::Model;
}
