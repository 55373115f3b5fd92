//! Seeded synthetic backend.
//!
//! Every group carries a random target matrix. A fixed subset of each group's
//! output rows ("forget rows") is only exercised by forget batches, the rest
//! only by retain batches. Pruning that follows the dual sensitivity should
//! therefore land on forget rows.

use std::collections::BTreeMap;

use ndarray::{Array2, Axis, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::backend::TrainingBackend;
use crate::error::{Error, Result};
use crate::model::{LoraFactors, ModelParameters, ParameterGroup, ParameterStore};
use crate::prune::DataStream;

/// Shape and dynamics of the synthetic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Number of parameter groups.
    pub groups: usize,
    /// Output rows per group.
    pub d_out: usize,
    /// Input columns per group.
    pub d_in: usize,
    /// LoRA rank; 0 attaches no adapter.
    pub lora_rank: usize,
    /// LoRA alpha.
    pub lora_alpha: f32,
    /// Forget batches per epoch.
    pub forget_batches: usize,
    /// Retain batches per epoch.
    pub retain_batches: usize,
    /// Fraction of each group's rows that only forget batches touch.
    pub forget_fraction: f32,
    /// SGD learning rate.
    pub learning_rate: f32,
    /// Multiplicative learning-rate decay per scheduler step.
    pub lr_decay: f32,
    /// Uniform gradient noise amplitude.
    pub noise: f32,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            groups: 4,
            d_out: 16,
            d_in: 16,
            lora_rank: 4,
            lora_alpha: 8.0,
            forget_batches: 4,
            retain_batches: 8,
            forget_fraction: 0.25,
            learning_rate: 0.05,
            lr_decay: 0.99,
            noise: 0.01,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.groups == 0 || self.d_out == 0 || self.d_in == 0 {
            return Err(Error::Config("groups, d_out and d_in must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.forget_fraction) {
            return Err(Error::Config(format!(
                "forget_fraction ({}) must be between 0.0 and 1.0",
                self.forget_fraction
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Config(format!("learning_rate ({}) must be positive", self.learning_rate)));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(Error::Config(format!("noise ({}) must be non-negative", self.noise)));
        }
        if self.retain_batches == 0 {
            return Err(Error::Config("retain_batches must be > 0".to_string()));
        }
        Ok(())
    }

    /// Name of group `index`.
    pub fn group_name(index: usize) -> String {
        format!("layers.{index}.proj")
    }
}

/// [`TrainingBackend`] over a synthetic regression model.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    config: SyntheticConfig,
    model: ModelParameters,
    targets: BTreeMap<String, Array2<f32>>,
    forget_rows: BTreeMap<String, Vec<bool>>,
    rng: StdRng,
    lr: f32,
}

impl SyntheticBackend {
    /// Build the model, targets and forget rows from `config.seed`.
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut model = ModelParameters::new();
        let mut targets = BTreeMap::new();
        let mut forget_rows = BTreeMap::new();

        let num_forget = (config.forget_fraction * config.d_out as f32).round() as usize;
        for index in 0..config.groups {
            let name = SyntheticConfig::group_name(index);
            let shape = (config.d_out, config.d_in);
            let weight = Array2::from_shape_fn(shape, |_| rng.random_range(-1.0f32..1.0));
            let target = Array2::from_shape_fn(shape, |_| rng.random_range(-1.0f32..1.0));

            let mut rows: Vec<usize> = (0..config.d_out).collect();
            rows.shuffle(&mut rng);
            let mut mask = vec![false; config.d_out];
            for &row in rows.iter().take(num_forget) {
                mask[row] = true;
            }

            let mut group = ParameterGroup::new(weight);
            if config.lora_rank > 0 {
                group = group.with_lora(LoraFactors::new(
                    config.d_out,
                    config.d_in,
                    config.lora_rank,
                    config.lora_alpha,
                ));
            }
            model.insert(name.clone(), group);
            targets.insert(name.clone(), target);
            forget_rows.insert(name, mask);
        }

        let lr = config.learning_rate;
        Ok(Self { config, model, targets, forget_rows, rng, lr })
    }

    /// Backend configuration.
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Rows of a group that only forget batches touch.
    pub fn forget_rows(&self, name: &str) -> Option<&[bool]> {
        self.forget_rows.get(name).map(Vec::as_slice)
    }

    /// Current learning rate.
    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    /// Mean squared error of `stream`'s rows without touching gradients.
    pub fn evaluate(&self, stream: DataStream) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (name, group) in self.model.iter() {
            let (Some(target), Some(rows)) = (self.targets.get(name), self.forget_rows.get(name))
            else {
                continue;
            };
            let effective = effective_weight(group);
            for (row, (eff, tgt)) in
                effective.axis_iter(Axis(0)).zip(target.axis_iter(Axis(0))).enumerate()
            {
                if rows[row] == (stream == DataStream::Forget) {
                    sum += eff.iter().zip(tgt.iter()).map(|(e, t)| (e - t).powi(2)).sum::<f32>();
                    count += eff.len();
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

/// `W + s·B·A`
fn effective_weight(group: &ParameterGroup) -> Array2<f32> {
    match &group.lora {
        Some(lora) => &group.weight + &(lora.b.dot(&lora.a) * lora.scale),
        None => group.weight.clone(),
    }
}

fn accumulate(slot: &mut Option<Array2<f32>>, grad: Array2<f32>) {
    match slot {
        Some(existing) if existing.dim() == grad.dim() => *existing += &grad,
        _ => *slot = Some(grad),
    }
}

impl TrainingBackend for SyntheticBackend {
    type Model = ModelParameters;

    fn num_batches(&self, stream: DataStream) -> usize {
        match stream {
            DataStream::Forget => self.config.forget_batches,
            DataStream::Retain => self.config.retain_batches,
        }
    }

    fn backward(&mut self, stream: DataStream, _index: usize) -> f32 {
        let noise = self.config.noise;
        let mut loss = 0.0;
        let mut count = 0usize;

        for name in self.model.group_names() {
            let (Some(target), Some(rows)) = (self.targets.get(&name), self.forget_rows.get(&name))
            else {
                continue;
            };
            let Some(group) = self.model.get_mut(&name) else { continue };

            let diff = effective_weight(group) - target;
            let mut grad = Array2::from_shape_fn(diff.dim(), |_| {
                self.rng.random_range(-1.0f32..=1.0) * noise
            });
            for (row, (mut g, d)) in
                grad.axis_iter_mut(Axis(0)).zip(diff.axis_iter(Axis(0))).enumerate()
            {
                if rows[row] == (stream == DataStream::Forget) {
                    Zip::from(&mut g).and(&d).for_each(|g, &d| *g += 2.0 * d);
                    loss += d.iter().map(|v| v * v).sum::<f32>();
                    count += d.len();
                }
            }

            if let Some(lora) = group.lora.as_mut() {
                let grad_b = grad.dot(&lora.a.t()) * lora.scale;
                let grad_a = lora.b.t().dot(&grad) * lora.scale;
                accumulate(&mut lora.grad_b, grad_b);
                accumulate(&mut lora.grad_a, grad_a);
            }
            if group.requires_grad {
                accumulate(&mut group.grad, grad);
            }
        }

        if count == 0 {
            0.0
        } else {
            loss / count as f32
        }
    }

    fn optimizer_step(&mut self) {
        let lr = self.lr;
        for name in self.model.group_names() {
            let Some(group) = self.model.get_mut(&name) else { continue };
            if group.requires_grad {
                if let Some(grad) = &group.grad {
                    group.weight.scaled_add(-lr, grad);
                }
            }
            if let Some(lora) = group.lora.as_mut() {
                if let Some(grad_a) = &lora.grad_a {
                    lora.a.scaled_add(-lr, grad_a);
                }
                if let Some(grad_b) = &lora.grad_b {
                    lora.b.scaled_add(-lr, grad_b);
                }
            }
        }
    }

    fn scheduler_step(&mut self) {
        self.lr *= self.config.lr_decay;
    }

    fn zero_grad(&mut self) {
        self.model.zero_grad();
    }

    fn model(&self) -> &ModelParameters {
        &self.model
    }

    fn model_mut(&mut self) -> &mut ModelParameters {
        &mut self.model
    }
}
