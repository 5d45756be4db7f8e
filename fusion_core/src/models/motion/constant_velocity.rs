// fusion_core/src/models/motion/constant_velocity.rs

use nalgebra::DMatrix;

use crate::models::motion::MotionModel;
use crate::state::StateVariable;
use crate::types::State;

// --- Constant Velocity Model ---
// Assumes the object keeps its velocity; unknown accelerations are absorbed by Q.
// The state is [px, py, vx, vy].
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVelocityModel {
    /// Variance of the x acceleration noise [m²/s⁴].
    pub noise_ax: f64,
    /// Variance of the y acceleration noise [m²/s⁴].
    pub noise_ay: f64,
}

impl Default for ConstantVelocityModel {
    fn default() -> Self {
        Self {
            noise_ax: 9.0,
            noise_ay: 9.0,
        }
    }
}

impl MotionModel for ConstantVelocityModel {
    fn get_state_layout(&self) -> Vec<StateVariable> {
        vec![
            StateVariable::Px,
            StateVariable::Py,
            StateVariable::Vx,
            StateVariable::Vy,
        ]
    }

    fn get_transition_matrix(&self, _x: &State, dt: f64) -> DMatrix<f64> {
        let mut f = DMatrix::identity(4, 4);
        // d(Position)/dt = Velocity
        f[(0, 2)] = dt;
        f[(1, 3)] = dt;
        f
    }

    fn get_process_noise(&self, _x: &State, dt: f64) -> DMatrix<f64> {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt / 2.0;
        let dt4 = dt2 * dt2 / 4.0;

        let mut q = DMatrix::zeros(4, 4);
        q[(0, 0)] = dt4 * self.noise_ax;
        q[(0, 2)] = dt3 * self.noise_ax;
        q[(1, 1)] = dt4 * self.noise_ay;
        q[(1, 3)] = dt3 * self.noise_ay;
        q[(2, 0)] = dt3 * self.noise_ax;
        q[(2, 2)] = dt2 * self.noise_ax;
        q[(3, 1)] = dt3 * self.noise_ay;
        q[(3, 3)] = dt2 * self.noise_ay;
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::DVector;

    #[test]
    fn test_zero_dt_is_identity_without_noise() {
        let model = ConstantVelocityModel::default();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(model.get_transition_matrix(&x, 0.0), DMatrix::identity(4, 4));
        assert_eq!(model.get_process_noise(&x, 0.0), DMatrix::zeros(4, 4));
    }

    #[test]
    fn test_propagate_moves_along_velocity() {
        let model = ConstantVelocityModel::default();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, -4.0]);
        let next = model.propagate(&x, 0.5);
        assert_abs_diff_eq!(next[0], 2.5);
        assert_abs_diff_eq!(next[1], 0.0);
        assert_abs_diff_eq!(next[2], 3.0);
        assert_abs_diff_eq!(next[3], -4.0);
    }

    #[test]
    fn test_process_noise_grows_with_dt() {
        let model = ConstantVelocityModel::default();
        let x = DVector::zeros(4);
        let mut previous = 0.0;
        for dt in [0.01, 0.05, 0.1, 0.5, 1.0] {
            let q = model.get_process_noise(&x, dt);
            assert_eq!(q, q.transpose());
            assert!(q.norm() > previous);
            previous = q.norm();
        }
    }
}
