//! Sticky pruning masks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ParameterStore;
use crate::prune::config::Granularity;

/// Mask over the units of one parameter group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMask {
    /// `true` for every pruned unit.
    pruned: Vec<bool>,
    /// Weights covered by one unit.
    unit_size: usize,
    /// Weight shape `(d_out, d_in)` the mask was built for.
    shape: (usize, usize),
}

impl GroupMask {
    fn new(shape: (usize, usize), granularity: Granularity) -> Self {
        Self {
            pruned: vec![false; granularity.unit_count(shape)],
            unit_size: granularity.unit_size(shape),
            shape,
        }
    }

    /// Number of units.
    pub fn num_units(&self) -> usize {
        self.pruned.len()
    }

    /// Weights covered by one unit.
    pub fn unit_size(&self) -> usize {
        self.unit_size
    }

    /// Weight shape the mask was built for.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Check if a unit is pruned.
    pub fn is_pruned(&self, unit: usize) -> bool {
        self.pruned.get(unit).copied().unwrap_or(false)
    }

    /// Number of pruned units.
    pub fn pruned_units(&self) -> usize {
        self.pruned.iter().filter(|&&p| p).count()
    }

    /// Indices of pruned units.
    pub fn pruned_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pruned.iter().enumerate().filter_map(|(i, &p)| p.then_some(i))
    }

    /// Fraction of this group's weights that are pruned.
    pub fn sparsity(&self) -> f32 {
        if self.pruned.is_empty() {
            return 0.0;
        }
        self.pruned_units() as f32 / self.pruned.len() as f32
    }
}

/// Pruned units of every group.
///
/// Grows monotonically: units can be marked but never unmarked, so achieved
/// sparsity never decreases over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PruningState {
    granularity: Granularity,
    masks: BTreeMap<String, GroupMask>,
}

impl PruningState {
    /// Empty state covering every group of a model.
    pub fn for_model<M: ParameterStore + ?Sized>(model: &M, granularity: Granularity) -> Self {
        let masks = model
            .group_names()
            .into_iter()
            .filter_map(|name| {
                let shape = model.group(&name)?.shape();
                Some((name, GroupMask::new(shape, granularity)))
            })
            .collect();
        Self { granularity, masks }
    }

    /// Pruning granularity the masks were built for.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Mask of one group.
    pub fn mask(&self, name: &str) -> Option<&GroupMask> {
        self.masks.get(name)
    }

    /// Iterate masks in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GroupMask)> {
        self.masks.iter()
    }

    /// Check if a unit is pruned.
    pub fn is_pruned(&self, name: &str, unit: usize) -> bool {
        self.masks.get(name).is_some_and(|m| m.is_pruned(unit))
    }

    /// Mark a unit as pruned. Returns true if it was not pruned before.
    pub(crate) fn mark(&mut self, name: &str, unit: usize) -> bool {
        match self.masks.get_mut(name).and_then(|m| m.pruned.get_mut(unit)) {
            Some(slot) if !*slot => {
                *slot = true;
                true
            }
            _ => false,
        }
    }

    /// Total weights covered by the masks.
    pub fn total_params(&self) -> usize {
        self.masks.values().map(|m| m.num_units() * m.unit_size).sum()
    }

    /// Weights currently pruned.
    pub fn pruned_params(&self) -> usize {
        self.masks.values().map(|m| m.pruned_units() * m.unit_size).sum()
    }

    /// Units currently pruned.
    pub fn pruned_units(&self) -> usize {
        self.masks.values().map(GroupMask::pruned_units).sum()
    }

    /// Fraction of weights pruned.
    pub fn achieved_ratio(&self) -> f32 {
        let total = self.total_params();
        if total == 0 {
            return 0.0;
        }
        (self.pruned_params() as f64 / total as f64) as f32
    }

    /// Check that the masks match the model's groups and shapes.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentShapes` on the first mismatch.
    pub fn check_against<M: ParameterStore + ?Sized>(&self, model: &M) -> Result<()> {
        let names = model.group_names();
        if names.len() != self.masks.len() {
            return Err(Error::shapes(format!(
                "model has {} groups, pruning state covers {}",
                names.len(),
                self.masks.len()
            )));
        }
        for name in &names {
            let mask = self
                .masks
                .get(name)
                .ok_or_else(|| Error::shapes(format!("group '{name}' has no pruning mask")))?;
            let shape = model
                .group(name)
                .ok_or_else(|| Error::shapes(format!("group '{name}' vanished from model")))?
                .shape();
            if shape != mask.shape {
                return Err(Error::shapes(format!(
                    "group '{name}' is {shape:?}, its mask was built for {:?}",
                    mask.shape
                )));
            }
        }
        Ok(())
    }
}
