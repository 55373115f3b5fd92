//! Property-based tests for the ratio schedule.

use proptest::prelude::*;

use super::{RampShape, RatioSchedule};

fn shape_strategy() -> impl Strategy<Value = RampShape> {
    prop_oneof![Just(RampShape::Linear), Just(RampShape::Cubic), Just(RampShape::Smoothstep)]
}

proptest! {
    /// Ratio is non-decreasing in step when init <= final
    #[test]
    fn ratio_monotonic(
        max_steps in 1usize..500,
        warmup in 0.0f32..1.0,
        cooldown in 0.0f32..1.0,
        init in 0.0f32..0.5,
        final_val in 0.5f32..1.0,
        shape in shape_strategy(),
    ) {
        let schedule = RatioSchedule::new(max_steps, warmup, cooldown, init, final_val)
            .unwrap()
            .with_shape(shape);

        let mut prev = schedule.ratio_at(0);
        for step in 1..=(max_steps + 5) {
            let ratio = schedule.ratio_at(step);
            prop_assert!(ratio >= prev, "step {} went {} -> {}", step, prev, ratio);
            prev = ratio;
        }
    }

    /// Ratio always lies between init and final
    #[test]
    fn ratio_bounded(
        max_steps in 1usize..1000,
        warmup in 0.0f32..1.0,
        cooldown in 0.0f32..1.0,
        init in 0.0f32..1.0,
        final_val in 0.0f32..1.0,
        step in 0usize..2000,
        shape in shape_strategy(),
    ) {
        let schedule = RatioSchedule::new(max_steps, warmup, cooldown, init, final_val)
            .unwrap()
            .with_shape(shape);
        let ratio = schedule.ratio_at(step);
        prop_assert!(ratio >= init.min(final_val));
        prop_assert!(ratio <= init.max(final_val));
    }

    /// Same inputs, same output
    #[test]
    fn ratio_deterministic(
        max_steps in 1usize..1000,
        step in 0usize..1000,
    ) {
        let a = RatioSchedule::new(max_steps, 0.1, 0.1, 0.0, 0.5).unwrap();
        let b = RatioSchedule::new(max_steps, 0.1, 0.1, 0.0, 0.5).unwrap();
        prop_assert_eq!(a.ratio_at(step), b.ratio_at(step));
    }
}
