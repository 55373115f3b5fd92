//! In-memory parameter groups.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayViewMut2};

use super::store::{GroupView, LoraView, ParameterStore};

/// LoRA factors attached to a frozen base weight.
#[derive(Debug, Clone)]
pub struct LoraFactors {
    /// Down-projection `[rank, d_in]`.
    pub a: Array2<f32>,
    /// Up-projection `[d_out, rank]`.
    pub b: Array2<f32>,
    /// Gradient of `A`.
    pub grad_a: Option<Array2<f32>>,
    /// Gradient of `B`.
    pub grad_b: Option<Array2<f32>>,
    /// Scaling factor (alpha / rank).
    pub scale: f32,
}

impl LoraFactors {
    /// Create adapter factors with the standard LoRA initialisation.
    ///
    /// `A` gets small deterministic values and `B` is zero, so the initial
    /// delta `B @ A` is zero.
    pub fn new(d_out: usize, d_in: usize, rank: usize, alpha: f32) -> Self {
        let a = Array2::from_shape_fn((rank, d_in), |(r, c)| {
            let i = (r * d_in + c) as f32;
            (i * 0.1).sin() * 0.01
        });
        let b = Array2::zeros((d_out, rank));
        let scale = if rank == 0 { 0.0 } else { alpha / rank as f32 };
        Self { a, b, grad_a: None, grad_b: None, scale }
    }

    /// Create adapter factors from explicit matrices.
    pub fn from_parts(a: Array2<f32>, b: Array2<f32>, scale: f32) -> Self {
        Self { a, b, grad_a: None, grad_b: None, scale }
    }

    /// Adapter rank.
    pub fn rank(&self) -> usize {
        self.a.nrows()
    }

    fn view(&self) -> LoraView<'_> {
        LoraView {
            a: self.a.view(),
            b: self.b.view(),
            grad_a: self.grad_a.as_ref().map(|g| g.view()),
            grad_b: self.grad_b.as_ref().map(|g| g.view()),
            scale: self.scale,
        }
    }
}

/// One prunable weight matrix with its optional gradient and adapter.
#[derive(Debug, Clone)]
pub struct ParameterGroup {
    /// Base weight `[d_out, d_in]`.
    pub weight: Array2<f32>,
    /// Gradient of the base weight.
    pub grad: Option<Array2<f32>>,
    /// Whether the base weight receives gradients.
    pub requires_grad: bool,
    /// Attached adapter.
    pub lora: Option<LoraFactors>,
}

impl ParameterGroup {
    /// Create a frozen group from a base weight.
    pub fn new(weight: Array2<f32>) -> Self {
        Self { weight, grad: None, requires_grad: false, lora: None }
    }

    /// Attach a LoRA adapter.
    pub fn with_lora(mut self, lora: LoraFactors) -> Self {
        self.lora = Some(lora);
        self
    }

    /// Number of exactly-zero weights.
    pub fn num_zeros(&self) -> usize {
        self.weight.iter().filter(|&&w| w == 0.0).count()
    }
}

/// Named parameter groups kept in a sorted map.
#[derive(Debug, Clone, Default)]
pub struct ModelParameters {
    groups: BTreeMap<String, ParameterGroup>,
}

impl ModelParameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a group.
    pub fn insert(&mut self, name: impl Into<String>, group: ParameterGroup) {
        self.groups.insert(name.into(), group);
    }

    /// Remove a group, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<ParameterGroup> {
        self.groups.remove(name)
    }

    /// Get a group by name.
    pub fn get(&self, name: &str) -> Option<&ParameterGroup> {
        self.groups.get(name)
    }

    /// Get a mutable group by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParameterGroup> {
        self.groups.get_mut(name)
    }

    /// Iterate over groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterGroup)> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Set (or replace) the base-weight gradient of a group.
    ///
    /// Returns false if the group does not exist.
    pub fn set_grad(&mut self, name: &str, grad: Array2<f32>) -> bool {
        match self.groups.get_mut(name) {
            Some(group) => {
                group.grad = Some(grad);
                true
            }
            None => false,
        }
    }

    /// Set the adapter gradients of a group.
    ///
    /// Returns false if the group does not exist or has no adapter.
    pub fn set_lora_grads(&mut self, name: &str, grad_a: Array2<f32>, grad_b: Array2<f32>) -> bool {
        match self.groups.get_mut(name).and_then(|g| g.lora.as_mut()) {
            Some(lora) => {
                lora.grad_a = Some(grad_a);
                lora.grad_b = Some(grad_b);
                true
            }
            None => false,
        }
    }

    /// Drop every gradient (base and adapter).
    pub fn zero_grad(&mut self) {
        for group in self.groups.values_mut() {
            group.grad = None;
            if let Some(lora) = group.lora.as_mut() {
                lora.grad_a = None;
                lora.grad_b = None;
            }
        }
    }

    /// Fraction of base-weight parameters that are exactly zero.
    pub fn sparsity(&self) -> f32 {
        let total: usize = self.groups.values().map(|g| g.weight.len()).sum();
        if total == 0 {
            return 0.0;
        }
        let zeros: usize = self.groups.values().map(ParameterGroup::num_zeros).sum();
        zeros as f32 / total as f32
    }
}

impl ParameterStore for ModelParameters {
    fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    fn group(&self, name: &str) -> Option<GroupView<'_>> {
        self.groups.get(name).map(|g| GroupView {
            weight: g.weight.view(),
            grad: g.grad.as_ref().map(|grad| grad.view()),
            lora: g.lora.as_ref().map(LoraFactors::view),
        })
    }

    fn weight_mut(&mut self, name: &str) -> Option<ArrayViewMut2<'_, f32>> {
        self.groups.get_mut(name).map(|g| g.weight.view_mut())
    }

    fn grad_mut(&mut self, name: &str) -> Option<ArrayViewMut2<'_, f32>> {
        self.groups.get_mut(name).and_then(|g| g.grad.as_mut()).map(|grad| grad.view_mut())
    }

    fn lora_b_mut(&mut self, name: &str) -> Option<ArrayViewMut2<'_, f32>> {
        self.groups.get_mut(name).and_then(|g| g.lora.as_mut()).map(|lora| lora.b.view_mut())
    }

    fn set_requires_grad(&mut self, name: &str, requires_grad: bool) {
        if let Some(group) = self.groups.get_mut(name) {
            group.requires_grad = requires_grad;
        }
    }

    fn num_params(&self) -> usize {
        self.groups.values().map(|g| g.weight.len()).sum()
    }
}
