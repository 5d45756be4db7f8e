// fusion_core/src/models/motion/ctrv.rs

use nalgebra::{DMatrix, DVector};

use crate::models::motion::MotionModel;
use crate::state::StateVariable;
use crate::types::{is_not_zero, State};
use crate::utils::angles::wrap_angle;

/// Constant Turn Rate and Velocity.
///
/// State `[px, py, v, yaw, yaw_rate]`. The object moves on a circular arc with constant
/// speed; longitudinal and yaw accelerations are zero-mean white noise.
#[derive(Debug, Clone, PartialEq)]
pub struct CtrvModel {
    /// Longitudinal acceleration noise std dev [m/s²].
    pub std_a: f64,
    /// Yaw acceleration noise std dev [rad/s²].
    pub std_yaw_dd: f64,
}

impl Default for CtrvModel {
    fn default() -> Self {
        Self {
            std_a: 1.5,
            std_yaw_dd: 0.6,
        }
    }
}

impl CtrvModel {
    /// Maps the two noise accelerations into state space over `dt`.
    fn noise_gain(yaw: f64, dt: f64) -> DMatrix<f64> {
        let half_dt2 = 0.5 * dt * dt;
        let mut g = DMatrix::zeros(5, 2);
        g[(0, 0)] = half_dt2 * yaw.cos();
        g[(1, 0)] = half_dt2 * yaw.sin();
        g[(2, 0)] = dt;
        g[(3, 1)] = half_dt2;
        g[(4, 1)] = dt;
        g
    }
}

impl MotionModel for CtrvModel {
    fn get_state_layout(&self) -> Vec<StateVariable> {
        vec![
            StateVariable::Px,
            StateVariable::Py,
            StateVariable::Speed,
            StateVariable::Yaw,
            StateVariable::YawRate,
        ]
    }

    fn propagate(&self, x: &State, dt: f64) -> State {
        let (v, yaw, yaw_rate) = (x[2], x[3], x[4]);
        let mut next = x.clone();

        if is_not_zero(yaw_rate) {
            let yaw_end = yaw + yaw_rate * dt;
            next[0] += v / yaw_rate * (yaw_end.sin() - yaw.sin());
            next[1] += v / yaw_rate * (yaw.cos() - yaw_end.cos());
        } else {
            // Straight line; the arc formula divides by ~0 here.
            next[0] += v * yaw.cos() * dt;
            next[1] += v * yaw.sin() * dt;
        }
        next[3] = wrap_angle(yaw + yaw_rate * dt);
        next
    }

    fn get_transition_matrix(&self, x: &State, dt: f64) -> DMatrix<f64> {
        let (v, yaw, yaw_rate) = (x[2], x[3], x[4]);
        let mut f = DMatrix::identity(5, 5);

        if is_not_zero(yaw_rate) {
            let yaw_end = yaw + yaw_rate * dt;
            let (s0, c0) = yaw.sin_cos();
            let (s1, c1) = yaw_end.sin_cos();
            let r = v / yaw_rate;

            f[(0, 2)] = (s1 - s0) / yaw_rate;
            f[(0, 3)] = r * (c1 - c0);
            f[(0, 4)] = -r / yaw_rate * (s1 - s0) + r * c1 * dt;

            f[(1, 2)] = (c0 - c1) / yaw_rate;
            f[(1, 3)] = r * (s1 - s0);
            f[(1, 4)] = -r / yaw_rate * (c0 - c1) + r * s1 * dt;
        } else {
            let (s0, c0) = yaw.sin_cos();
            f[(0, 2)] = c0 * dt;
            f[(0, 3)] = -v * s0 * dt;
            f[(0, 4)] = -0.5 * v * s0 * dt * dt;

            f[(1, 2)] = s0 * dt;
            f[(1, 3)] = v * c0 * dt;
            f[(1, 4)] = 0.5 * v * c0 * dt * dt;
        }
        f[(3, 4)] = dt;
        f
    }

    fn get_process_noise(&self, x: &State, dt: f64) -> DMatrix<f64> {
        let g = Self::noise_gain(x[3], dt);
        let accel_cov = DMatrix::from_diagonal(&DVector::from_vec(vec![
            self.std_a * self.std_a,
            self.std_yaw_dd * self.std_yaw_dd,
        ]));
        &g * accel_cov * g.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn numerical_jacobian(model: &CtrvModel, x: &State, dt: f64) -> DMatrix<f64> {
        let eps = 1e-6;
        let mut jac = DMatrix::zeros(5, 5);
        for j in 0..5 {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[j] += eps;
            minus[j] -= eps;
            let mut column = (model.propagate(&plus, dt) - model.propagate(&minus, dt)) / (2.0 * eps);
            column[3] = wrap_angle(column[3] * 2.0 * eps) / (2.0 * eps);
            jac.column_mut(j).copy_from(&column);
        }
        jac
    }

    #[test]
    fn test_zero_dt_is_identity_without_noise() {
        let model = CtrvModel::default();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 0.4, 0.2]);
        assert_eq!(model.get_transition_matrix(&x, 0.0), DMatrix::identity(5, 5));
        assert_eq!(model.get_process_noise(&x, 0.0), DMatrix::zeros(5, 5));
        assert_eq!(model.propagate(&x, 0.0), x);
    }

    #[test]
    fn test_straight_line_motion() {
        let model = CtrvModel::default();
        let x = DVector::from_vec(vec![0.0, 0.0, 2.0, FRAC_PI_2, 0.0]);
        let next = model.propagate(&x, 1.5);
        assert_abs_diff_eq!(next[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[3], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_turn_on_unit_circle() {
        // Speed 1, yaw rate 1 => radius 1. Start at (1, 0) heading north.
        let model = CtrvModel::default();
        let x = DVector::from_vec(vec![1.0, 0.0, 1.0, FRAC_PI_2, 1.0]);
        let next = model.propagate(&x, FRAC_PI_2);
        assert_abs_diff_eq!(next[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[3], PI, epsilon = 1e-12);
    }

    #[test]
    fn test_transition_matrix_matches_finite_differences() {
        let model = CtrvModel::default();
        for x in [
            DVector::from_vec(vec![1.0, -2.0, 3.0, 0.7, 0.4]),
            DVector::from_vec(vec![1.0, -2.0, 3.0, -2.0, -0.05]),
        ] {
            let analytic = model.get_transition_matrix(&x, 0.1);
            let numeric = numerical_jacobian(&model, &x, 0.1);
            for (a, n) in analytic.iter().zip(numeric.iter()) {
                assert_abs_diff_eq!(*a, *n, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_process_noise_is_symmetric_and_grows() {
        let model = CtrvModel::default();
        let x = DVector::from_vec(vec![0.0, 0.0, 5.0, 0.3, 0.1]);
        let mut previous = 0.0;
        for dt in [0.01, 0.05, 0.1, 0.5, 1.0] {
            let q = model.get_process_noise(&x, dt);
            let asym = (&q - q.transpose()).abs().max();
            assert!(asym < 1e-15);
            assert!(q.trace() > previous);
            previous = q.trace();
        }
    }
}
