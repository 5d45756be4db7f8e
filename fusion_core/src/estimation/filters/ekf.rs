// fusion_core/src/estimation/filters/ekf.rs

use nalgebra::{DMatrix, DVector};

use crate::error::FilterError;
use crate::estimation::{check_predict, check_update, StateEstimator};
use crate::models::measurement::MeasurementModel;
use crate::models::motion::MotionModel;
use crate::state::{GaussianState, StateVariable};
use crate::types::State;

/// PURE FUNCTION: Performs one EKF prediction step.
/// Takes a state and returns the new, predicted state. It has no side effects.
pub fn ekf_predict(
    current_state: &GaussianState,
    motion_model: &dyn MotionModel,
    dt: f64,
) -> Result<GaussianState, FilterError> {
    let n = current_state.dim();
    let x = &current_state.vector;

    // Linearize around the prior mean: F and Q are both evaluated there.
    let f_jac = motion_model.get_transition_matrix(x, dt);
    let q = motion_model.get_process_noise(x, dt);
    if f_jac.shape() != (n, n) || q.shape() != (n, n) {
        return Err(FilterError::DimensionMismatch {
            what: "transition/process noise matrix",
            expected: n,
            actual: f_jac.nrows(),
        });
    }

    // x = f(x, dt), which is exactly F·x for linear models.
    let new_x = motion_model.propagate(x, dt);
    // P = F·P·Fᵗ + Q
    let new_p = &f_jac * &current_state.covariance * f_jac.transpose() + q;

    let mut predicted = GaussianState {
        layout: current_state.layout.clone(),
        vector: new_x,
        covariance: new_p,
    };
    predicted.normalize_angles();
    predicted.symmetrize_covariance();

    if !predicted.is_finite() {
        return Err(FilterError::NumericalDivergence);
    }
    Ok(predicted)
}

/// PURE FUNCTION: Performs one EKF measurement update step.
/// Returns the corrected state together with the NIS of the innovation.
pub fn ekf_update(
    predicted_state: &GaussianState,
    measurement_model: &dyn MeasurementModel,
    z: &DVector<f64>,
) -> Result<(GaussianState, f64), FilterError> {
    let n = predicted_state.dim();
    let x_priori = &predicted_state.vector;
    let p_priori = &predicted_state.covariance;

    let h_jacobian = measurement_model.get_measurement_matrix(x_priori);
    let r_matrix = measurement_model.get_measurement_noise();
    if h_jacobian.ncols() != n {
        return Err(FilterError::DimensionMismatch {
            what: "measurement matrix columns",
            expected: n,
            actual: h_jacobian.ncols(),
        });
    }

    // The innovation always comes from the model's own h(x); for radar that is the
    // nonlinear polar mapping, not H·x.
    let z_pred = measurement_model.predict_measurement(x_priori);
    let y = measurement_model.residual(z, &z_pred);

    let s = &h_jacobian * p_priori * h_jacobian.transpose() + r_matrix;
    if s.iter().any(|v| !v.is_finite()) {
        return Err(FilterError::SingularInnovation);
    }
    let s_inv = s
        .cholesky()
        .ok_or(FilterError::SingularInnovation)?
        .inverse();

    let k_gain = p_priori * h_jacobian.transpose() * &s_inv;

    let new_x = x_priori + &k_gain * &y;
    let i_kh = DMatrix::<f64>::identity(n, n) - &k_gain * &h_jacobian;
    let new_p = i_kh * p_priori;

    let nis = y.dot(&(&s_inv * &y));

    let mut corrected = GaussianState {
        layout: predicted_state.layout.clone(),
        vector: new_x,
        covariance: new_p,
    };
    corrected.normalize_angles();
    corrected.symmetrize_covariance();

    if !corrected.is_finite() || !nis.is_finite() {
        return Err(FilterError::NumericalDivergence);
    }
    Ok((corrected, nis))
}

/// A concrete implementation of an Extended Kalman Filter.
#[derive(Debug, Clone)]
pub struct ExtendedKalmanFilter {
    /// The current belief (x, P).
    state: GaussianState,
    initialized: bool,
}

impl ExtendedKalmanFilter {
    /// Creates an uninitialized EKF whose covariance starts at `initial_covariance · I`.
    pub fn new(layout: Vec<StateVariable>, initial_covariance: f64) -> Self {
        Self {
            state: GaussianState::new(layout, initial_covariance),
            initialized: false,
        }
    }
}

impl StateEstimator for ExtendedKalmanFilter {
    fn name(&self) -> &'static str {
        "EKF"
    }

    fn initialize(&mut self, initial_state: State) -> Result<(), FilterError> {
        if self.initialized {
            return Err(FilterError::AlreadyInitialized);
        }
        if initial_state.len() != self.state.dim() {
            return Err(FilterError::DimensionMismatch {
                what: "initial state",
                expected: self.state.dim(),
                actual: initial_state.len(),
            });
        }
        self.state.vector = initial_state;
        self.state.normalize_angles();
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn predict(&mut self, motion_model: &dyn MotionModel, dt: f64) -> Result<(), FilterError> {
        check_predict(self.initialized, dt)?;
        if dt == 0.0 {
            return Ok(());
        }
        self.state = ekf_predict(&self.state, motion_model, dt)?;
        Ok(())
    }

    fn update(
        &mut self,
        measurement_model: &dyn MeasurementModel,
        z: &DVector<f64>,
    ) -> Result<f64, FilterError> {
        check_update(self.initialized, self.state.dim(), measurement_model, z)?;
        let (corrected, nis) = ekf_update(&self.state, measurement_model, z)?;
        self.state = corrected;
        Ok(nis)
    }

    fn get_state(&self) -> &GaussianState {
        &self.state
    }
}
