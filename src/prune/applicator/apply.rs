//! Threshold-gated greedy pruning.

use std::collections::BTreeSet;

use ndarray::{s, ArrayViewMut2, Axis};

use super::decision::{PruningDecision, SkipReason};
use super::state::PruningState;
use crate::error::{Error, Result};
use crate::model::ParameterStore;
use crate::prune::config::{Granularity, UnlearnPruneConfig};
use crate::prune::dual::DualSensitivity;

/// A unit that may be pruned this step.
#[derive(Debug)]
struct Candidate<'a> {
    group: &'a str,
    unit: usize,
    score: f64,
    size: usize,
}

/// Decides when to prune, selects units and zeroes them in the live model.
#[derive(Debug, Clone)]
pub struct PruningApplicator {
    init_ratio: f32,
    final_ratio: f32,
    threshold: f32,
    prune_freq: usize,
    state: PruningState,
}

impl PruningApplicator {
    /// Create an applicator with an empty mask over every group of `model`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchedule` if `prune_freq` is zero.
    pub fn new<M: ParameterStore + ?Sized>(
        init_ratio: f32,
        final_ratio: f32,
        threshold: f32,
        prune_freq: usize,
        granularity: Granularity,
        model: &M,
    ) -> Result<Self> {
        if prune_freq == 0 {
            return Err(Error::InvalidSchedule("prune_freq must be at least 1".to_string()));
        }
        Ok(Self {
            init_ratio,
            final_ratio,
            threshold,
            prune_freq,
            state: PruningState::for_model(model, granularity),
        })
    }

    /// Create an applicator from a validated configuration.
    pub fn from_config<M: ParameterStore + ?Sized>(
        config: &UnlearnPruneConfig,
        model: &M,
    ) -> Result<Self> {
        Self::new(
            config.init_ratio(),
            config.ratio(),
            config.unlearning_threshold(),
            config.prune_freq(),
            config.granularity(),
            model,
        )
    }

    /// Current masks.
    pub fn state(&self) -> &PruningState {
        &self.state
    }

    /// Replace the masks (checkpoint restore).
    pub(crate) fn replace_state(&mut self, state: PruningState) {
        self.state = state;
    }

    /// Unlearning threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pruning cadence in steps.
    pub fn prune_freq(&self) -> usize {
        self.prune_freq
    }

    /// Achieved sparsity so far.
    pub fn current_ratio(&self) -> f32 {
        self.state.achieved_ratio()
    }

    /// Why `step` would not attempt pruning at `target_ratio`, if it would not.
    ///
    /// Cadence is checked before the window so off-cadence steps never look at
    /// the schedule.
    pub fn gate(&self, step: usize, target_ratio: f32) -> Option<SkipReason> {
        if step % self.prune_freq != 0 {
            return Some(SkipReason::Cadence);
        }
        if !(target_ratio > self.init_ratio && target_ratio < self.final_ratio) {
            return Some(SkipReason::OutsideWindow);
        }
        None
    }

    /// Prune the highest-scoring units if this step passes the gate.
    ///
    /// Candidates are unpruned units whose dual score is strictly above the
    /// threshold, ranked by score descending (ties by group name, then unit
    /// index). Units are taken in that order until pruned weights reach
    /// `ceil(target_ratio × total)`. Running out of candidates first is
    /// reported as a shortfall.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentShapes` if the dual scores or the masks do not
    /// match the model's current groups.
    pub fn maybe_prune<M: ParameterStore + ?Sized>(
        &mut self,
        model: &mut M,
        dual: &DualSensitivity,
        target_ratio: f32,
        step: usize,
    ) -> Result<PruningDecision> {
        let ratio_before = self.current_ratio();
        if let Some(reason) = self.gate(step, target_ratio) {
            return Ok(PruningDecision::skipped(step, reason, target_ratio, ratio_before));
        }

        self.state.check_against(model)?;
        self.check_scores(dual)?;

        let total = self.state.total_params();
        let goal = (f64::from(target_ratio) * total as f64).ceil() as usize;
        let already = self.state.pruned_params();
        if already >= goal {
            return Ok(PruningDecision::skipped(step, SkipReason::TargetMet, target_ratio, ratio_before));
        }

        let mut candidates = Vec::new();
        let mut below_threshold = 0;
        let threshold = f64::from(self.threshold);
        for (name, scores) in dual.iter() {
            let Some(mask) = self.state.mask(name) else { continue };
            for (unit, &score) in scores.iter().enumerate() {
                if mask.is_pruned(unit) {
                    continue;
                }
                if score > threshold {
                    candidates.push(Candidate { group: name, unit, score, size: mask.unit_size() });
                } else {
                    below_threshold += 1;
                }
            }
        }
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.group.cmp(b.group))
                .then_with(|| a.unit.cmp(&b.unit))
        });

        let mut needed = goal - already;
        let mut selected = Vec::new();
        for candidate in candidates {
            if needed == 0 {
                break;
            }
            needed = needed.saturating_sub(candidate.size);
            selected.push((candidate.group.to_string(), candidate.unit));
        }

        let mut params_pruned = 0;
        let mut groups_touched = BTreeSet::new();
        for (group, unit) in &selected {
            if self.state.mark(group, *unit) {
                params_pruned += self.state.mask(group).map_or(0, |m| m.unit_size());
                zero_unit(model, group, *unit, self.state.granularity());
                groups_touched.insert(group.clone());
            }
        }

        let decision = PruningDecision {
            step,
            attempted: true,
            skip_reason: None,
            target_ratio,
            ratio_before,
            achieved_ratio: self.current_ratio(),
            units_pruned: selected.len(),
            params_pruned,
            groups_touched: groups_touched.into_iter().collect(),
            below_threshold,
            shortfall: needed,
        };

        if decision.has_shortfall() {
            tracing::warn!(
                step,
                target = decision.target_ratio,
                achieved = decision.achieved_ratio,
                shortfall = decision.shortfall,
                below_threshold,
                "too few units cleared the unlearning threshold"
            );
        }
        tracing::info!(
            step,
            target = decision.target_ratio,
            achieved = decision.achieved_ratio,
            units = decision.units_pruned,
            groups = decision.groups_touched.len(),
            "pruned"
        );
        Ok(decision)
    }

    /// Zero every pruned unit again, e.g. after an optimizer step moved them.
    pub fn enforce_masks<M: ParameterStore + ?Sized>(&self, model: &mut M) {
        let granularity = self.state.granularity();
        for (name, mask) in self.state.iter() {
            for unit in mask.pruned_indices() {
                zero_unit(model, name, unit, granularity);
            }
        }
    }

    fn check_scores(&self, dual: &DualSensitivity) -> Result<()> {
        if dual.len() != self.state.iter().count() {
            return Err(Error::shapes(format!(
                "dual scores cover {} groups, model has {}",
                dual.len(),
                self.state.iter().count()
            )));
        }
        for (name, mask) in self.state.iter() {
            let scores = dual
                .get(name)
                .ok_or_else(|| Error::shapes(format!("no dual scores for group '{name}'")))?;
            if scores.len() != mask.num_units() {
                return Err(Error::shapes(format!(
                    "group '{name}' has {} units, dual scores have {}",
                    mask.num_units(),
                    scores.len()
                )));
            }
        }
        Ok(())
    }
}

/// Zero one unit's weights and gradient. Channel units also zero the matching
/// row of the LoRA up-projection so the adapter cannot revive the channel.
fn zero_unit<M: ParameterStore + ?Sized>(model: &mut M, name: &str, unit: usize, granularity: Granularity) {
    match granularity {
        Granularity::Channel => {
            if let Some(mut weight) = model.weight_mut(name) {
                if unit < weight.nrows() {
                    weight.index_axis_mut(Axis(0), unit).fill(0.0);
                }
            }
            if let Some(mut grad) = model.grad_mut(name) {
                if unit < grad.nrows() {
                    grad.index_axis_mut(Axis(0), unit).fill(0.0);
                }
            }
            if let Some(mut b) = model.lora_b_mut(name) {
                if unit < b.nrows() {
                    b.slice_mut(s![unit, ..]).fill(0.0);
                }
            }
        }
        Granularity::Element => {
            if let Some(mut weight) = model.weight_mut(name) {
                if let Some(v) = element_mut(&mut weight, unit) {
                    *v = 0.0;
                }
            }
            if let Some(mut grad) = model.grad_mut(name) {
                if let Some(v) = element_mut(&mut grad, unit) {
                    *v = 0.0;
                }
            }
        }
    }
}

fn element_mut<'a>(array: &'a mut ArrayViewMut2<'_, f32>, unit: usize) -> Option<&'a mut f32> {
    let d_in = array.ncols();
    if d_in == 0 {
        return None;
    }
    array.get_mut((unit / d_in, unit % d_in))
}
