//! The `ParameterStore` trait and borrowed group views.

use ndarray::{ArrayView2, ArrayViewMut2};

/// Borrowed view of a LoRA adapter attached to a parameter group.
///
/// For a frozen weight `W ∈ ℝ^(d_out × d_in)` the adapter contributes
/// `ΔW = scale · B @ A` with `A ∈ ℝ^(r × d_in)` and `B ∈ ℝ^(d_out × r)`.
#[derive(Debug, Clone)]
pub struct LoraView<'a> {
    /// Down-projection `[rank, d_in]`.
    pub a: ArrayView2<'a, f32>,
    /// Up-projection `[d_out, rank]`.
    pub b: ArrayView2<'a, f32>,
    /// Gradient of `A`, if the last backward pass produced one.
    pub grad_a: Option<ArrayView2<'a, f32>>,
    /// Gradient of `B`, if the last backward pass produced one.
    pub grad_b: Option<ArrayView2<'a, f32>>,
    /// Scaling factor (alpha / rank).
    pub scale: f32,
}

/// Borrowed view of one prunable parameter group.
#[derive(Debug, Clone)]
pub struct GroupView<'a> {
    /// Base weight `[d_out, d_in]`.
    pub weight: ArrayView2<'a, f32>,
    /// Gradient of the base weight, if available.
    pub grad: Option<ArrayView2<'a, f32>>,
    /// Attached LoRA adapter, if any.
    pub lora: Option<LoraView<'a>>,
}

impl GroupView<'_> {
    /// Shape of the base weight as `(d_out, d_in)`.
    pub fn shape(&self) -> (usize, usize) {
        self.weight.dim()
    }
}

/// Access to the live model parameters.
///
/// Group names must be stable for the lifetime of a run. Implementations
/// return them in a deterministic order so every worker makes the same
/// pruning decision from the same state.
pub trait ParameterStore {
    /// Names of all prunable groups, in deterministic order.
    fn group_names(&self) -> Vec<String>;

    /// Read-only view of a group.
    fn group(&self, name: &str) -> Option<GroupView<'_>>;

    /// Mutable access to a group's base weight.
    fn weight_mut(&mut self, name: &str) -> Option<ArrayViewMut2<'_, f32>>;

    /// Mutable access to a group's base-weight gradient.
    fn grad_mut(&mut self, _name: &str) -> Option<ArrayViewMut2<'_, f32>> {
        None
    }

    /// Mutable access to a group's LoRA up-projection `B`.
    fn lora_b_mut(&mut self, _name: &str) -> Option<ArrayViewMut2<'_, f32>> {
        None
    }

    /// Enable or disable gradient computation for a group's base weight.
    fn set_requires_grad(&mut self, _name: &str, _requires_grad: bool) {}

    /// Total number of base-weight parameters across all groups.
    fn num_params(&self) -> usize {
        self.group_names()
            .iter()
            .filter_map(|name| self.group(name))
            .map(|g| g.weight.len())
            .sum()
    }
}
