//! Property-based tests for dual-score monotonicity.

use proptest::prelude::*;

use super::combine;

proptest! {
    /// Score is non-decreasing in the forget value
    #[test]
    fn dual_monotone_in_forget(
        f1 in 0.0f64..1e6,
        df in 0.0f64..1e6,
        r in 0.0f64..1e6,
        eps in 1e-12f64..1e-2,
    ) {
        prop_assert!(combine(f1 + df, r, eps) >= combine(f1, r, eps));
    }

    /// Score is non-increasing in the retain value
    #[test]
    fn dual_antitone_in_retain(
        f in 0.0f64..1e6,
        r1 in 0.0f64..1e6,
        dr in 0.0f64..1e6,
        eps in 1e-12f64..1e-2,
    ) {
        prop_assert!(combine(f, r1 + dr, eps) <= combine(f, r1, eps));
    }

    /// Score is finite for every non-negative finite input
    #[test]
    fn dual_finite(
        f in 0.0f64..1.0,
        r in 0.0f64..1.0,
        eps in 1e-12f64..1e-2,
    ) {
        prop_assert!(combine(f, r, eps).is_finite());
    }
}
