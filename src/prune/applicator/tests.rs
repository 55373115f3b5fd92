//! Unit tests for the pruning applicator.

use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2};

use super::*;
use crate::error::Error;
use crate::model::{LoraFactors, ModelParameters, ParameterGroup, ParameterStore};
use crate::prune::config::Granularity;
use crate::prune::dual::{DualSensitivity, DualSensitivityCombiner};
use crate::prune::sensitivity::{SensitivityDict, SensitivityValue};

fn two_scalar_groups() -> ModelParameters {
    let mut model = ModelParameters::new();
    model.insert("A", ParameterGroup::new(array![[1.0]]));
    model.insert("B", ParameterGroup::new(array![[1.0]]));
    model
}

fn dual(entries: &[(&str, Vec<f64>)]) -> DualSensitivity {
    entries.iter().map(|(name, scores)| (name.to_string(), Array1::from(scores.clone()))).collect()
}

fn dict(entries: &[(&str, f64)]) -> SensitivityDict {
    entries
        .iter()
        .map(|(name, v)| (name.to_string(), SensitivityValue::from_scores(array![*v])))
        .collect()
}

fn applicator(model: &ModelParameters, threshold: f32, granularity: Granularity) -> PruningApplicator {
    PruningApplicator::new(0.0, 0.9, threshold, 10, granularity, model).unwrap()
}

#[test]
fn test_scenario_b_prunes_forget_heavy_group() {
    // TEST_ID: APP-001
    let mut model = two_scalar_groups();
    let forget = dict(&[("A", 10.0), ("B", 1.0)]);
    let retain = dict(&[("A", 1.0), ("B", 10.0)]);
    let scores = DualSensitivityCombiner::default().combine_dicts(&forget, &retain).unwrap();

    let mut app = applicator(&model, 0.5, Granularity::Channel);
    let decision = app.maybe_prune(&mut model, &scores, 0.5, 10).unwrap();

    assert!(decision.attempted);
    assert_eq!(decision.units_pruned, 1, "APP-001 FALSIFIED: expected exactly one unit");
    assert_eq!(decision.groups_touched, vec!["A".to_string()]);
    assert!(app.state().is_pruned("A", 0));
    assert!(!app.state().is_pruned("B", 0));
    assert_eq!(model.get("A").unwrap().weight[[0, 0]], 0.0);
    assert_eq!(model.get("B").unwrap().weight[[0, 0]], 1.0);
    assert_abs_diff_eq!(decision.achieved_ratio, 0.5);
}

#[test]
fn test_scenario_c_cadence_gate_ignores_scores() {
    // TEST_ID: APP-002
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    // Empty scores would be a shape error if the gate let the step through.
    let decision = app.maybe_prune(&mut model, &DualSensitivity::default(), 0.5, 7).unwrap();
    assert!(decision.is_noop(), "APP-002 FALSIFIED: off-cadence step pruned");
    assert!(!decision.attempted);
    assert_eq!(decision.skip_reason, Some(SkipReason::Cadence));
    assert_eq!(app.state().pruned_units(), 0);
}

#[test]
fn test_window_gate_is_open_interval() {
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    let scores = dual(&[("A", vec![5.0]), ("B", vec![5.0])]);

    let at_floor = app.maybe_prune(&mut model, &scores, 0.0, 10).unwrap();
    assert_eq!(at_floor.skip_reason, Some(SkipReason::OutsideWindow));

    let at_ceiling = app.maybe_prune(&mut model, &scores, 0.9, 20).unwrap();
    assert_eq!(at_ceiling.skip_reason, Some(SkipReason::OutsideWindow));
    assert_eq!(app.state().pruned_units(), 0);
}

#[test]
fn test_threshold_gate_reports_shortfall() {
    // TEST_ID: APP-003
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 1.0, Granularity::Channel);
    let scores = dual(&[("A", vec![1.0]), ("B", vec![0.2])]);

    let decision = app.maybe_prune(&mut model, &scores, 0.5, 10).unwrap();
    assert!(decision.attempted);
    assert!(decision.is_noop(), "APP-003 FALSIFIED: unit at threshold was pruned");
    assert_eq!(decision.below_threshold, 2);
    assert_eq!(decision.shortfall, 1);
    assert!(decision.has_shortfall());
    assert_eq!(model.get("A").unwrap().weight[[0, 0]], 1.0);
}

#[test]
fn test_partial_shortfall_prunes_what_qualifies() {
    let mut model = ModelParameters::new();
    model.insert("g", ParameterGroup::new(Array2::ones((4, 1))));
    let mut app = applicator(&model, 0.5, Granularity::Channel);
    let scores = dual(&[("g", vec![2.0, 0.1, 0.4, 0.6])]);

    let decision = app.maybe_prune(&mut model, &scores, 0.75, 10).unwrap();
    assert_eq!(decision.units_pruned, 2);
    assert_eq!(decision.shortfall, 1);
    assert!(app.state().is_pruned("g", 0));
    assert!(app.state().is_pruned("g", 3));
    assert!(!app.state().is_pruned("g", 2));
}

#[test]
fn test_masks_are_sticky() {
    // TEST_ID: APP-004
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);

    app.maybe_prune(&mut model, &dual(&[("A", vec![9.0]), ("B", vec![1.0])]), 0.5, 10).unwrap();
    assert!(app.state().is_pruned("A", 0));

    // Scores flip; A stays pruned and B is the only remaining candidate.
    let flipped = dual(&[("A", vec![0.0]), ("B", vec![9.0])]);
    let decision = app.maybe_prune(&mut model, &flipped, 0.6, 20).unwrap();
    assert!(app.state().is_pruned("A", 0), "APP-004 FALSIFIED: mask was revived");
    assert_eq!(decision.groups_touched, vec!["B".to_string()]);
    assert!(decision.achieved_ratio >= decision.ratio_before);
}

#[test]
fn test_target_already_met_skips() {
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    let scores = dual(&[("A", vec![9.0]), ("B", vec![1.0])]);
    app.maybe_prune(&mut model, &scores, 0.5, 10).unwrap();

    let again = app.maybe_prune(&mut model, &scores, 0.5, 20).unwrap();
    assert_eq!(again.skip_reason, Some(SkipReason::TargetMet));
    assert_eq!(app.state().pruned_units(), 1);
}

#[test]
fn test_ties_break_by_name_then_unit() {
    let mut model = ModelParameters::new();
    model.insert("b", ParameterGroup::new(Array2::ones((2, 1))));
    model.insert("a", ParameterGroup::new(Array2::ones((2, 1))));
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    let scores = dual(&[("a", vec![1.0, 1.0]), ("b", vec![1.0, 1.0])]);

    app.maybe_prune(&mut model, &scores, 0.25, 10).unwrap();
    assert!(app.state().is_pruned("a", 0));
    assert_eq!(app.state().pruned_units(), 1);
}

#[test]
fn test_mismatched_scores_are_rejected() {
    // TEST_ID: APP-005
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);

    let missing = dual(&[("A", vec![1.0])]);
    let err = app.maybe_prune(&mut model, &missing, 0.5, 10).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)), "APP-005 FALSIFIED: got {err:?}");

    let wrong_len = dual(&[("A", vec![1.0, 2.0]), ("B", vec![1.0])]);
    let err = app.maybe_prune(&mut model, &wrong_len, 0.5, 10).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)));
}

#[test]
fn test_architecture_change_is_rejected() {
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    model.insert("A", ParameterGroup::new(Array2::ones((3, 1))));
    let scores = dual(&[("A", vec![1.0, 1.0, 1.0]), ("B", vec![1.0])]);
    let err = app.maybe_prune(&mut model, &scores, 0.5, 10).unwrap_err();
    assert!(matches!(err, Error::InconsistentShapes(_)));
}

#[test]
fn test_channel_pruning_zeroes_grad_and_adapter_row() {
    let mut model = ModelParameters::new();
    let lora = LoraFactors::from_parts(Array2::ones((1, 3)), Array2::ones((2, 1)), 1.0);
    model.insert("q", ParameterGroup::new(Array2::ones((2, 3))).with_lora(lora));
    model.set_grad("q", Array2::ones((2, 3)));
    let mut app = applicator(&model, 0.0, Granularity::Channel);

    let decision = app.maybe_prune(&mut model, &dual(&[("q", vec![0.1, 3.0])]), 0.5, 10).unwrap();
    assert_eq!(decision.params_pruned, 3);

    let group = model.get("q").unwrap();
    assert_eq!(group.weight.row(1).to_vec(), vec![0.0; 3]);
    assert_eq!(group.weight.row(0).to_vec(), vec![1.0; 3]);
    assert_eq!(group.grad.as_ref().unwrap().row(1).to_vec(), vec![0.0; 3]);
    assert_eq!(group.lora.as_ref().unwrap().b.row(1).to_vec(), vec![0.0]);
    assert_eq!(group.lora.as_ref().unwrap().b.row(0).to_vec(), vec![1.0]);
}

#[test]
fn test_element_pruning_zeroes_single_weights() {
    let mut model = ModelParameters::new();
    model.insert("w", ParameterGroup::new(array![[1.0, 2.0], [3.0, 4.0]]));
    let mut app = applicator(&model, 0.0, Granularity::Element);

    let scores = dual(&[("w", vec![0.1, 5.0, 4.0, 0.2])]);
    let decision = app.maybe_prune(&mut model, &scores, 0.5, 10).unwrap();
    assert_eq!(decision.units_pruned, 2);
    assert_eq!(model.get("w").unwrap().weight, array![[1.0f32, 0.0], [0.0, 4.0]]);
}

#[test]
fn test_enforce_masks_rezeroes_after_update() {
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    app.maybe_prune(&mut model, &dual(&[("A", vec![9.0]), ("B", vec![1.0])]), 0.5, 10).unwrap();

    // An optimizer step writes into the pruned weight.
    if let Some(mut w) = model.weight_mut("A") {
        w[[0, 0]] = 0.7;
    }
    app.enforce_masks(&mut model);
    assert_eq!(model.get("A").unwrap().weight[[0, 0]], 0.0);
    assert_eq!(model.get("B").unwrap().weight[[0, 0]], 1.0);
}

#[test]
fn test_zero_prune_freq_rejected() {
    let model = two_scalar_groups();
    let err = PruningApplicator::new(0.0, 0.5, 0.1, 0, Granularity::Channel, &model).unwrap_err();
    assert!(matches!(err, Error::InvalidSchedule(_)));
}

#[test]
fn test_state_serde_roundtrip() {
    let mut model = two_scalar_groups();
    let mut app = applicator(&model, 0.0, Granularity::Channel);
    app.maybe_prune(&mut model, &dual(&[("A", vec![9.0]), ("B", vec![1.0])]), 0.5, 10).unwrap();

    let json = serde_json::to_string(app.state()).unwrap();
    let back: PruningState = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, app.state());
    assert!(back.check_against(&model).is_ok());
}
