//! Compactly-supported interaction weights.
//!
//! The operators only ever use these weights in normalized summations
//! (Shepard-style density, symmetric pairwise forces), so the usual
//! kernel normalization constant cancels and is omitted.

/// Weight of a pair at distance `r` with support radius `radius`.
///
/// Cubic falloff `(1 - r/radius)³`, zero at and beyond the support
/// radius, one at zero distance.
pub fn weight(r: f64, radius: f64) -> f64 {
    debug_assert!(radius > 0.0);
    let q = r / radius;
    if q < 1.0 {
        let t = 1.0 - q;
        t * t * t
    } else {
        0.0
    }
}

/// Radial derivative dW/dr of [`weight`]; negative inside the support.
pub fn weight_derivative(r: f64, radius: f64) -> f64 {
    debug_assert!(radius > 0.0);
    let q = r / radius;
    if q < 1.0 {
        let t = 1.0 - q;
        -3.0 * t * t / radius
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weight_is_one_at_zero_distance() {
        assert_eq!(weight(0.0, 0.2), 1.0);
    }

    #[test]
    fn weight_vanishes_at_support_radius() {
        assert_eq!(weight(0.2, 0.2), 0.0);
        assert_eq!(weight(0.5, 0.2), 0.0);
    }

    #[test]
    fn weight_decreases_monotonically() {
        let w1 = weight(0.05, 0.2);
        let w2 = weight(0.10, 0.2);
        let w3 = weight(0.15, 0.2);
        assert!(w1 > w2 && w2 > w3 && w3 > 0.0);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let radius = 0.2;
        let r = 0.07;
        let eps = 1e-7;
        let fd = (weight(r + eps, radius) - weight(r - eps, radius)) / (2.0 * eps);
        assert_relative_eq!(weight_derivative(r, radius), fd, epsilon = 1e-6);
    }

    #[test]
    fn derivative_is_zero_outside_support() {
        assert_eq!(weight_derivative(0.3, 0.2), 0.0);
    }

    use proptest::prelude::*;

    proptest! {
        /// The weight stays in [0, 1], vanishes at and beyond the
        /// support radius, and never increases with distance.
        #[test]
        fn weight_is_bounded_compact_and_nonincreasing(
            r in 0.0f64..1.0,
            radius in 0.01f64..0.5,
        ) {
            let w = weight(r, radius);
            prop_assert!((0.0..=1.0).contains(&w));
            if r >= radius {
                prop_assert_eq!(w, 0.0);
            }
            prop_assert!(weight_derivative(r, radius) <= 0.0);
        }
    }
}
