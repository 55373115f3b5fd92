//! Unit tests for sensitivity tracking.

use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2};

use super::*;
use crate::error::Error;
use crate::model::{LoraFactors, ModelParameters, ParameterGroup, ParameterStore};
use crate::prune::config::{Granularity, PruneMetric};

fn model_with_grad() -> ModelParameters {
    let mut model = ModelParameters::new();
    model.insert("layer.0", ParameterGroup::new(array![[1.0, -2.0], [3.0, 4.0]]));
    model.set_grad("layer.0", array![[0.5, 0.5], [1.0, -1.0]]);
    model
}

fn scores_of(tracker: &SensitivityTracker, name: &str) -> Vec<f64> {
    tracker.sensitivity().get(name).map(|v| v.scores().to_vec()).unwrap_or_default()
}

// =============================================================================
// SensitivityValue
// =============================================================================

#[test]
fn test_value_starts_at_zero() {
    let value = SensitivityValue::zeros(3);
    assert_eq!(value.len(), 3);
    assert_eq!(value.updates(), 0);
    assert!(value.scores().iter().all(|&v| v == 0.0));
    assert_eq!(value.mean_unit_contribution(), 0.0);
}

#[test]
fn test_value_accumulates_sum() {
    let mut value = SensitivityValue::zeros(2);
    value.accumulate(&array![1.0, 2.0], None).unwrap();
    value.accumulate(&array![0.5, 0.0], None).unwrap();
    assert_eq!(value.scores().to_vec(), vec![1.5, 2.0]);
    assert_eq!(value.updates(), 2);
    assert_abs_diff_eq!(value.total(), 3.5);
}

#[test]
fn test_value_rejects_length_mismatch() {
    let mut value = SensitivityValue::zeros(2);
    let err = value.accumulate(&array![1.0], None).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)));
}

#[test]
fn test_value_ignores_negative_contributions() {
    let mut value = SensitivityValue::zeros(2);
    value.accumulate(&array![-5.0, 1.0], None).unwrap();
    assert_eq!(value.scores().to_vec(), vec![0.0, 1.0]);
}

#[test]
fn test_value_saturates_instead_of_overflowing() {
    // TEST_ID: SENS-001
    let mut value = SensitivityValue::from_scores(array![f64::MAX, 1.0]);
    for _ in 0..10 {
        value.accumulate(&array![f64::MAX, f64::MAX], None).unwrap();
    }
    assert!(
        value.scores().iter().all(|v| v.is_finite()),
        "SENS-001 FALSIFIED: accumulation overflowed"
    );
    assert_eq!(value.scores()[0], f64::MAX);
}

#[test]
fn test_outlier_clip_caps_spikes() {
    // TEST_ID: SENS-002
    let mut value = SensitivityValue::zeros(2);
    value.accumulate(&array![1.0, 1.0], Some(10.0)).unwrap();
    value.accumulate(&array![1000.0, 0.5], Some(10.0)).unwrap();
    assert_abs_diff_eq!(value.scores()[0], 11.0);
    assert_abs_diff_eq!(value.scores()[1], 1.5);
}

#[test]
fn test_outlier_clip_keeps_consistently_important_unit() {
    // TEST_ID: SENS-003
    let mut step = Array1::from_elem(100, 1.0);
    step[0] = 1000.0;
    let mut value = SensitivityValue::zeros(100);
    for _ in 0..200 {
        value.accumulate(&step, Some(10.0)).unwrap();
    }
    assert_abs_diff_eq!(value.scores()[0] / value.scores()[1], 1000.0, epsilon = 1e-9);
}

#[test]
fn test_outlier_clip_caps_spike_on_important_unit() {
    let mut value = SensitivityValue::zeros(2);
    for _ in 0..4 {
        value.accumulate(&array![100.0, 1.0], Some(10.0)).unwrap();
    }
    value.accumulate(&array![1e9, 1.0], Some(10.0)).unwrap();
    assert_abs_diff_eq!(value.scores()[0], 400.0 + 1000.0);
}

#[test]
fn test_outlier_clip_inactive_without_history() {
    let mut value = SensitivityValue::zeros(1);
    value.accumulate(&array![1000.0], Some(10.0)).unwrap();
    assert_abs_diff_eq!(value.scores()[0], 1000.0);
}

// =============================================================================
// Importance
// =============================================================================

#[test]
fn test_grad_importance_channel_and_element() {
    let model = model_with_grad();
    let view = model.group("layer.0").unwrap();
    let channel = compute_importance("layer.0", &view, PruneMetric::Grad, Granularity::Channel).unwrap();
    assert_eq!(channel.to_vec(), vec![1.5, 7.0]);
    let element = compute_importance("layer.0", &view, PruneMetric::Grad, Granularity::Element).unwrap();
    assert_eq!(element.to_vec(), vec![0.5, 1.0, 3.0, 4.0]);
}

#[test]
fn test_grad_importance_shape_mismatch() {
    let mut model = model_with_grad();
    model.set_grad("layer.0", Array2::zeros((3, 2)));
    let view = model.group("layer.0").unwrap();
    let err = compute_importance("layer.0", &view, PruneMetric::Grad, Granularity::Channel).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)));
}

#[test]
fn test_lora_importance_without_adapter_is_magnitude() {
    let model = model_with_grad();
    let view = model.group("layer.0").unwrap();
    let element = compute_importance("layer.0", &view, PruneMetric::Lora, Granularity::Element).unwrap();
    assert_eq!(element.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_lora_importance_from_adapter_delta() {
    // W = 0, B·A = [[1, 2], [0, 0]], scale 1 → |ΔW ⊙ ΔW|
    let lora = LoraFactors::from_parts(array![[1.0, 2.0]], array![[1.0], [0.0]], 1.0);
    let mut model = ModelParameters::new();
    model.insert("q", ParameterGroup::new(Array2::zeros((2, 2))).with_lora(lora));
    let view = model.group("q").unwrap();
    let element = compute_importance("q", &view, PruneMetric::Lora, Granularity::Element).unwrap();
    assert_eq!(element.to_vec(), vec![1.0, 4.0, 0.0, 0.0]);
}

#[test]
fn test_lora_importance_from_adapter_grads() {
    // A = [[1, 1]], B = [[1], [1]], scale 2, ∂A = 0, ∂B = [[1], [0]]
    // ΔW = 2·[[1, 1], [1, 1]], W_eff = 1 + 2 = 3 everywhere
    // G_eff = 2·(∂B·A) = [[2, 2], [0, 0]] → importance [[6, 6], [0, 0]]
    let lora = LoraFactors::from_parts(array![[1.0, 1.0]], array![[1.0], [1.0]], 2.0);
    let mut model = ModelParameters::new();
    model.insert("q", ParameterGroup::new(Array2::ones((2, 2))).with_lora(lora));
    model.set_lora_grads("q", Array2::zeros((1, 2)), array![[1.0], [0.0]]);
    let view = model.group("q").unwrap();
    let channel = compute_importance("q", &view, PruneMetric::Lora, Granularity::Channel).unwrap();
    assert_eq!(channel.to_vec(), vec![12.0, 0.0]);
}

#[test]
fn test_lora_importance_rejects_bad_adapter() {
    let lora = LoraFactors::from_parts(Array2::ones((1, 3)), Array2::ones((2, 1)), 1.0);
    let mut model = ModelParameters::new();
    model.insert("q", ParameterGroup::new(Array2::ones((2, 2))).with_lora(lora));
    let view = model.group("q").unwrap();
    let err = compute_importance("q", &view, PruneMetric::Lora, Granularity::Channel).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)));
}

// =============================================================================
// SensitivityTracker
// =============================================================================

#[test]
fn test_tracker_zero_initialized_over_groups() {
    let mut model = model_with_grad();
    model.insert("layer.1", ParameterGroup::new(Array2::ones((3, 2))));
    let tracker = SensitivityTracker::new(DataStream::Forget, PruneMetric::Grad, Granularity::Channel, &model);
    assert_eq!(tracker.sensitivity().len(), 2);
    assert_eq!(tracker.sensitivity().total_units(), 5);
    assert_eq!(tracker.stream(), DataStream::Forget);
}

#[test]
fn test_tracker_update_accumulates() {
    let model = model_with_grad();
    let mut tracker =
        SensitivityTracker::new(DataStream::Retain, PruneMetric::Grad, Granularity::Channel, &model);
    assert!(tracker.update(&model).unwrap());
    assert!(tracker.update(&model).unwrap());
    assert_eq!(scores_of(&tracker, "layer.0"), vec![3.0, 14.0]);
}

#[test]
fn test_tracker_missing_gradient() {
    // TEST_ID: SENS-010
    let mut model = model_with_grad();
    model.insert("layer.1", ParameterGroup::new(Array2::ones((2, 2))));
    let mut tracker =
        SensitivityTracker::new(DataStream::Forget, PruneMetric::Grad, Granularity::Channel, &model);
    let err = tracker.update(&model).unwrap_err();
    assert!(
        matches!(err, Error::MissingGradient { ref group } if group == "layer.1"),
        "SENS-010 FALSIFIED: got {err:?}"
    );
    assert_eq!(scores_of(&tracker, "layer.0"), vec![0.0, 0.0], "failed update must not apply");
}

#[test]
fn test_tracker_lora_metric_needs_no_gradient() {
    let mut model = ModelParameters::new();
    model.insert("frozen", ParameterGroup::new(array![[2.0, 0.0]]));
    let mut tracker =
        SensitivityTracker::new(DataStream::Forget, PruneMetric::Lora, Granularity::Element, &model);
    assert!(tracker.update(&model).is_ok());
    assert_eq!(scores_of(&tracker, "frozen"), vec![2.0, 0.0]);
}

#[test]
fn test_tracker_skips_non_finite_step() {
    let mut model = model_with_grad();
    let mut tracker =
        SensitivityTracker::new(DataStream::Forget, PruneMetric::Grad, Granularity::Channel, &model);
    tracker.update(&model).unwrap();
    model.set_grad("layer.0", array![[f32::NAN, 0.0], [0.0, 0.0]]);
    assert!(!tracker.update(&model).unwrap());
    assert_eq!(scores_of(&tracker, "layer.0"), vec![1.5, 7.0]);
}

#[test]
fn test_tracker_detects_architecture_change() {
    // TEST_ID: SENS-020
    let mut model = model_with_grad();
    let mut tracker =
        SensitivityTracker::new(DataStream::Retain, PruneMetric::Grad, Granularity::Channel, &model);
    model.insert("layer.0", ParameterGroup::new(Array2::ones((4, 2))));
    model.set_grad("layer.0", Array2::ones((4, 2)));
    let err = tracker.update(&model).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)), "SENS-020 FALSIFIED: got {err:?}");

    tracker.reset(&model);
    assert!(tracker.update(&model).is_ok());
}

#[test]
fn test_dict_check_against_missing_group() {
    let model = model_with_grad();
    let dict: SensitivityDict =
        [("other".to_string(), SensitivityValue::zeros(2))].into_iter().collect();
    assert!(matches!(
        dict.check_against(&model, Granularity::Channel),
        Err(Error::InconsistentShapes(_))
    ));
}

#[test]
fn test_dict_serde_roundtrip_is_verbatim() {
    let model = model_with_grad();
    let mut tracker =
        SensitivityTracker::new(DataStream::Forget, PruneMetric::Grad, Granularity::Element, &model);
    tracker.update(&model).unwrap();
    let json = serde_json::to_string(tracker.sensitivity()).unwrap();
    let back: SensitivityDict = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, tracker.sensitivity());
    assert_eq!(back.get("layer.0").map(|v| v.scores().clone()), Some(Array1::from(vec![0.5, 1.0, 3.0, 4.0])));
}
