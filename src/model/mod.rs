//! Model-side seam for the pruning engine
//!
//! The engine never owns parameter storage. It reads weights, gradients and
//! LoRA factors through [`ParameterStore`] and writes zeros back through the
//! same trait. [`ModelParameters`] is a plain in-memory implementation used by
//! the CLI simulation and the tests.

mod params;
mod store;


pub use params::{LoraFactors, ModelParameters, ParameterGroup};
pub use store::{GroupView, LoraView, ParameterStore};
