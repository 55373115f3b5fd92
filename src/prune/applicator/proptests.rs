//! Property-based tests for threshold-gated sticky pruning.

use ndarray::{Array1, Array2};
use proptest::prelude::*;

use super::PruningApplicator;
use crate::model::{ModelParameters, ParameterGroup};
use crate::prune::config::Granularity;
use crate::prune::dual::DualSensitivity;

const GROUPS: [&str; 3] = ["g0", "g1", "g2"];

fn model() -> ModelParameters {
    let mut model = ModelParameters::new();
    for name in GROUPS {
        model.insert(name, ParameterGroup::new(Array2::from_elem((3, 2), 1.0)));
    }
    model
}

fn granularity_strategy() -> impl Strategy<Value = Granularity> {
    prop_oneof![Just(Granularity::Channel), Just(Granularity::Element)]
}

fn units(granularity: Granularity) -> usize {
    match granularity {
        Granularity::Channel => 3,
        Granularity::Element => 6,
    }
}

fn pruned_set(app: &PruningApplicator) -> Vec<(String, usize)> {
    app.state()
        .iter()
        .flat_map(|(name, mask)| mask.pruned_indices().map(move |u| (name.clone(), u)))
        .collect()
}

proptest! {
    /// No unit at or below the threshold is ever pruned, and pruned units stay pruned
    #[test]
    fn pruning_is_threshold_gated_and_sticky(
        granularity in granularity_strategy(),
        threshold in 0.0f32..1.0,
        rounds in prop::collection::vec(
            (prop::collection::vec(0.0f64..2.0, 18), 0.01f32..0.89),
            1..12,
        ),
    ) {
        let mut model = model();
        let mut app = PruningApplicator::new(0.0, 0.9, threshold, 1, granularity, &model).unwrap();
        let n = units(granularity);

        for (step, (raw, target)) in rounds.into_iter().enumerate() {
            let dual: DualSensitivity = GROUPS
                .iter()
                .enumerate()
                .map(|(g, name)| (name.to_string(), Array1::from(raw[g * n..(g + 1) * n].to_vec())))
                .collect();
            let before = pruned_set(&app);

            app.maybe_prune(&mut model, &dual, target, step).unwrap();
            let after = pruned_set(&app);

            for unit in &before {
                prop_assert!(after.contains(unit), "{:?} was unpruned at step {}", unit, step);
            }
            for (name, unit) in after.iter().filter(|u| !before.contains(u)) {
                let score = dual.get(name).map(|s| s[*unit]).unwrap_or(f64::NAN);
                prop_assert!(
                    score > f64::from(threshold),
                    "{}[{}] pruned with score {} <= threshold {}",
                    name, unit, score, threshold
                );
            }
        }

        for (name, mask) in app.state().iter() {
            let weight = &model.get(name).unwrap().weight;
            for unit in mask.pruned_indices() {
                let zeroed = match granularity {
                    Granularity::Channel => weight.row(unit).iter().all(|&w| w == 0.0),
                    Granularity::Element => weight[[unit / 2, unit % 2]] == 0.0,
                };
                prop_assert!(zeroed, "{}[{}] is masked but not zeroed", name, unit);
            }
        }
    }
}
