//! Property-based tests for sensitivity accumulation.

use ndarray::Array1;
use proptest::prelude::*;

use super::SensitivityValue;

proptest! {
    /// No sequence of updates ever lowers a unit's score
    #[test]
    fn sensitivity_never_decreases(
        steps in prop::collection::vec(prop::collection::vec(-1e3f64..1e6, 4), 1..40),
        clip in prop::option::of(1.0f64..20.0),
    ) {
        let mut value = SensitivityValue::zeros(4);
        let mut prev = value.scores().clone();
        for step in steps {
            value.accumulate(&Array1::from(step), clip).unwrap();
            for (before, after) in prev.iter().zip(value.scores().iter()) {
                prop_assert!(after >= before, "{} dropped to {}", before, after);
            }
            prev = value.scores().clone();
        }
    }

    /// Scores stay finite even for huge contributions
    #[test]
    fn sensitivity_stays_finite(
        magnitude in 1e300f64..f64::MAX,
        updates in 1usize..50,
    ) {
        let mut value = SensitivityValue::zeros(2);
        for _ in 0..updates {
            value.accumulate(&Array1::from(vec![magnitude, magnitude]), None).unwrap();
        }
        prop_assert!(value.scores().iter().all(|v| v.is_finite()));
        prop_assert!(value.total().is_finite());
    }
}
