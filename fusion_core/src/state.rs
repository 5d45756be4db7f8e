// fusion_core/src/state.rs

use nalgebra::{DMatrix, DVector, Vector2, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::types::{Covariance, State};
use crate::utils::angles::wrap_angle;

/// An enum that defines every variable that can appear in a tracked object's state vector.
/// All quantities are expressed in the fixed sensor-origin frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateVariable {
    // --- Cartesian Position ---
    Px,
    Py,
    // --- Cartesian Velocity ---
    Vx,
    Vy,
    // --- Polar Velocity (CTRV) ---
    /// Speed magnitude along the heading.
    Speed,
    /// Heading angle, kept in (-π, π].
    Yaw,
    YawRate,
}

impl StateVariable {
    pub fn is_angle(&self) -> bool {
        matches!(self, StateVariable::Yaw)
    }
}

/// The Gaussian belief owned by a filter: the state vector bundled with its schema
/// (the layout) and its covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianState {
    /// The ordered "schema" of the state vector.
    pub layout: Vec<StateVariable>,
    /// The mean `x`.
    pub vector: State,
    /// The covariance `P`.
    pub covariance: Covariance,
}

impl GaussianState {
    /// Creates a zero mean with a diagonal prior of `initial_covariance_val`.
    pub fn new(layout: Vec<StateVariable>, initial_covariance_val: f64) -> Self {
        let dim = layout.len();
        Self {
            layout,
            vector: DVector::zeros(dim),
            covariance: DMatrix::identity(dim, dim) * initial_covariance_val,
        }
    }

    /// Returns the dimension (number of rows) of the state vector.
    pub fn dim(&self) -> usize {
        self.layout.len()
    }

    /// Finds the index of a specific `StateVariable` in the layout.
    pub fn find_idx(&self, var: StateVariable) -> Option<usize> {
        self.layout.iter().position(|v| *v == var)
    }

    /// Wraps every angular component of the mean back into (-π, π].
    pub fn normalize_angles(&mut self) {
        for (i, var) in self.layout.iter().enumerate() {
            if var.is_angle() {
                self.vector[i] = wrap_angle(self.vector[i]);
            }
        }
    }

    /// Tiny numerical errors make P drift away from symmetric. This forces it back.
    pub fn symmetrize_covariance(&mut self) {
        self.covariance = (&self.covariance + self.covariance.transpose()) * 0.5;
    }

    pub fn is_finite(&self) -> bool {
        self.vector.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
    }
}

/// `a - b` with angular components wrapped.
pub fn state_difference(layout: &[StateVariable], a: &State, b: &State) -> State {
    let mut diff = a - b;
    for (i, var) in layout.iter().enumerate() {
        if var.is_angle() {
            diff[i] = wrap_angle(diff[i]);
        }
    }
    diff
}

// =========================================================================
// == Index lookup for sensor models ==
// =========================================================================

/// Where the velocity lives in a given layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityIndices {
    Cartesian { vx: usize, vy: usize },
    Polar { speed: usize, yaw: usize },
    Absent,
}

/// Resolved positions of the kinematic quantities sensors observe.
///
/// Measurement models resolve this once from the motion model's layout so they can work
/// with bare state vectors (as the sigma-point machinery needs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KinematicIndices {
    pub px: usize,
    pub py: usize,
    pub velocity: VelocityIndices,
    pub dim: usize,
}

impl KinematicIndices {
    pub fn from_layout(layout: &[StateVariable]) -> Result<Self, FilterError> {
        let find = |var: StateVariable| layout.iter().position(|v| *v == var);

        let px = find(StateVariable::Px).ok_or(FilterError::UnsupportedLayout("Px"))?;
        let py = find(StateVariable::Py).ok_or(FilterError::UnsupportedLayout("Py"))?;

        let velocity = match (
            find(StateVariable::Vx),
            find(StateVariable::Vy),
            find(StateVariable::Speed),
            find(StateVariable::Yaw),
        ) {
            (Some(vx), Some(vy), _, _) => VelocityIndices::Cartesian { vx, vy },
            (_, _, Some(speed), Some(yaw)) => VelocityIndices::Polar { speed, yaw },
            _ => VelocityIndices::Absent,
        };

        Ok(Self {
            px,
            py,
            velocity,
            dim: layout.len(),
        })
    }

    pub fn position(&self, x: &State) -> Vector2<f64> {
        Vector2::new(x[self.px], x[self.py])
    }

    pub fn velocity(&self, x: &State) -> Vector2<f64> {
        match self.velocity {
            VelocityIndices::Cartesian { vx, vy } => Vector2::new(x[vx], x[vy]),
            VelocityIndices::Polar { speed, yaw } => {
                Vector2::new(x[speed] * x[yaw].cos(), x[speed] * x[yaw].sin())
            }
            VelocityIndices::Absent => Vector2::zeros(),
        }
    }

    /// `[px, py, vx, vy]`, the common ground every layout can be compared on.
    pub fn cartesian(&self, x: &State) -> Vector4<f64> {
        let p = self.position(x);
        let v = self.velocity(x);
        Vector4::new(p.x, p.y, v.x, v.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn ctrv_layout() -> Vec<StateVariable> {
        vec![
            StateVariable::Px,
            StateVariable::Py,
            StateVariable::Speed,
            StateVariable::Yaw,
            StateVariable::YawRate,
        ]
    }

    #[test]
    fn test_new_state_is_zero_mean_diagonal_prior() {
        let state = GaussianState::new(ctrv_layout(), 2.5);
        assert_eq!(state.dim(), 5);
        assert!(state.vector.iter().all(|v| *v == 0.0));
        assert_eq!(state.covariance, DMatrix::identity(5, 5) * 2.5);
    }

    #[test]
    fn test_state_difference_wraps_yaw_only() {
        let layout = ctrv_layout();
        let a = DVector::from_vec(vec![1.0, 0.0, 0.0, PI - 0.1, 0.0]);
        let b = DVector::from_vec(vec![0.0, 0.0, 0.0, -PI + 0.1, 0.0]);
        let d = state_difference(&layout, &a, &b);
        assert_abs_diff_eq!(d[0], 1.0);
        assert_abs_diff_eq!(d[3], -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_kinematic_indices_polar_velocity() {
        let idx = KinematicIndices::from_layout(&ctrv_layout()).unwrap();
        let x = DVector::from_vec(vec![1.0, 2.0, 2.0, PI / 2.0, 0.0]);
        let c = idx.cartesian(&x);
        assert_abs_diff_eq!(c[2], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[3], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_kinematic_indices_requires_position() {
        let err = KinematicIndices::from_layout(&[StateVariable::Vx, StateVariable::Vy]).unwrap_err();
        assert_eq!(err, FilterError::UnsupportedLayout("Px"));
    }
}
