//! Per-step importance estimation.

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::model::{GroupView, LoraView};
use crate::prune::config::{Granularity, PruneMetric};

/// Compute one step's importance contribution for a parameter group.
///
/// Returns one non-negative value per prunable unit. Channel granularity
/// sums element importance over each output row.
///
/// # Errors
///
/// - `MissingGradient` if `metric` is `grad` and the group has no gradient
/// - `InconsistentShapes` if gradient or adapter shapes do not fit the weight
pub fn compute_importance(
    name: &str,
    view: &GroupView<'_>,
    metric: PruneMetric,
    granularity: Granularity,
) -> Result<Array1<f64>> {
    let elementwise = match metric {
        PruneMetric::Grad => grad_importance(name, view)?,
        PruneMetric::Lora => match &view.lora {
            Some(lora) => lora_importance(name, view.weight, lora)?,
            None => view.weight.mapv(f32::abs),
        },
    };

    let units = match granularity {
        Granularity::Element => elementwise.iter().map(|&v| f64::from(v)).collect(),
        Granularity::Channel => elementwise.mapv(f64::from).sum_axis(Axis(1)),
    };
    Ok(units)
}

/// `|W ⊙ ∂W|`
fn grad_importance(name: &str, view: &GroupView<'_>) -> Result<Array2<f32>> {
    let grad = view
        .grad
        .as_ref()
        .ok_or_else(|| Error::MissingGradient { group: name.to_string() })?;
    if grad.dim() != view.weight.dim() {
        return Err(Error::shapes(format!(
            "gradient of '{name}' is {:?}, weight is {:?}",
            grad.dim(),
            view.weight.dim()
        )));
    }
    Ok((&view.weight * grad).mapv(f32::abs))
}

/// `|G_eff ⊙ W_eff|` with `W_eff = W + s·B·A`.
///
/// `G_eff` estimates the base-weight gradient from the adapter gradients,
/// `s·(∂B·A + B·∂A)`. Without adapter gradients it falls back to the adapter
/// delta `s·B·A`.
fn lora_importance(name: &str, weight: ArrayView2<'_, f32>, lora: &LoraView<'_>) -> Result<Array2<f32>> {
    let (d_out, d_in) = weight.dim();
    let rank = lora.a.nrows();
    if lora.a.ncols() != d_in || lora.b.dim() != (d_out, rank) {
        return Err(Error::shapes(format!(
            "adapter of '{name}' has A {:?} and B {:?}, weight is {:?}",
            lora.a.dim(),
            lora.b.dim(),
            weight.dim()
        )));
    }

    let grads_fit = lora.grad_a.as_ref().map_or(true, |ga| ga.dim() == lora.a.dim())
        && lora.grad_b.as_ref().map_or(true, |gb| gb.dim() == lora.b.dim());
    if !grads_fit {
        return Err(Error::shapes(format!(
            "adapter gradients of '{name}' do not match the adapter factors"
        )));
    }

    let delta = lora.b.dot(&lora.a) * lora.scale;
    let effective = &weight + &delta;

    let grad_from_b = lora.grad_b.as_ref().map(|gb| gb.dot(&lora.a));
    let grad_from_a = lora.grad_a.as_ref().map(|ga| lora.b.dot(ga));
    let g_eff = match (grad_from_b, grad_from_a) {
        (Some(gb), Some(ga)) => (gb + ga) * lora.scale,
        (Some(g), None) | (None, Some(g)) => g * lora.scale,
        (None, None) => delta,
    };

    Ok((g_eff * effective).mapv(f32::abs))
}
