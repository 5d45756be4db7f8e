// fusion_core/src/utils/angles.rs

use num_traits::{Float, FloatConst};

/// Wraps an angle into the half-open interval (-π, π].
///
/// Every bearing or heading difference must go through this before it is used in an
/// innovation or a sigma-point spread.
pub fn wrap_angle<T: Float + FloatConst>(theta: T) -> T {
    if !theta.is_finite() {
        return theta;
    }
    let two_pi = T::TAU();
    let mut wrapped = theta % two_pi;
    if wrapped > T::PI() {
        wrapped = wrapped - two_pi;
    } else if wrapped <= -T::PI() {
        wrapped = wrapped + two_pi;
    }
    wrapped
}

/// The signed shortest rotation taking `b` to `a`.
pub fn angle_difference<T: Float + FloatConst>(a: T, b: T) -> T {
    wrap_angle(a - b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_wrap_angle_leaves_principal_values_alone() {
        for theta in [0.0, 0.5, -0.5, 3.0, -3.0, PI] {
            assert_abs_diff_eq!(wrap_angle(theta), theta, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_wrap_angle_maps_minus_pi_to_pi() {
        assert_abs_diff_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_angle_large_multiples() {
        assert_abs_diff_eq!(wrap_angle(5.5 * PI), -0.5 * PI, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_angle(4.0 * PI + 0.25), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_angle(-4.0 * PI - 0.25), -0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_difference_across_the_cut() {
        let d = angle_difference(-PI + 0.05, PI - 0.05);
        assert_abs_diff_eq!(d, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_angle_f32() {
        let wrapped = wrap_angle(3.0 * std::f32::consts::PI / 2.0);
        assert_abs_diff_eq!(wrapped, -std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }
}
