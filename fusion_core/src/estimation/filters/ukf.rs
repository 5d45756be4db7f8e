// fusion_core/src/estimation/filters/ukf.rs

use nalgebra::{Cholesky, DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::estimation::{check_predict, check_update, StateEstimator};
use crate::models::measurement::MeasurementModel;
use crate::models::motion::MotionModel;
use crate::state::{state_difference, GaussianState, StateVariable};
use crate::types::State;

/// Configuration parameters for the UKF's sigma point generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct UkfParams {
    pub alpha: f64, // Spreading of sigma points
    pub beta: f64,  // Incorporates prior knowledge of distribution (2.0 is optimal for Gaussian)
    pub kappa: f64, // Secondary scaling parameter
}

impl Default for UkfParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 2.0,
            kappa: 0.0,
        }
    }
}

impl UkfParams {
    /// The composite scaling `λ = α²(n + κ) − n`.
    pub fn lambda(&self, n: usize) -> f64 {
        self.alpha.powi(2) * (n as f64 + self.kappa) - n as f64
    }
}

/// A concrete implementation of an Unscented Kalman Filter.
///
/// Nonlinear motion and measurement functions are evaluated on `2n + 1` sigma points, so
/// no Jacobians are needed. Process noise is additive.
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter {
    state: GaussianState,
    initialized: bool,
    params: UkfParams,

    // --- UKF-specific internal state ---
    /// Weights for calculating the mean from sigma points.
    weights_m: DVector<f64>,
    /// Weights for calculating the covariance from sigma points.
    weights_c: DVector<f64>,
}

impl UnscentedKalmanFilter {
    pub fn new(
        layout: Vec<StateVariable>,
        initial_covariance: f64,
        params: UkfParams,
    ) -> Result<Self, FilterError> {
        let n = layout.len();
        let lambda = params.lambda(n);
        if !lambda.is_finite() || n as f64 + lambda <= 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "UKF scaling n + lambda must be positive (alpha={}, kappa={})",
                params.alpha, params.kappa
            )));
        }

        // Calculate the weights for the 2n+1 sigma points.
        let mut weights_m = DVector::from_element(2 * n + 1, 0.5 / (n as f64 + lambda));
        let mut weights_c = DVector::from_element(2 * n + 1, 0.5 / (n as f64 + lambda));
        weights_m[0] = lambda / (n as f64 + lambda);
        weights_c[0] = weights_m[0] + (1.0 - params.alpha.powi(2) + params.beta);

        Ok(Self {
            state: GaussianState::new(layout, initial_covariance),
            initialized: false,
            params,
            weights_m,
            weights_c,
        })
    }

    pub fn params(&self) -> &UkfParams {
        &self.params
    }

    /// Generates the `2n+1` sigma points (one per column) from the current belief.
    fn generate_sigma_points(&self) -> Result<DMatrix<f64>, FilterError> {
        let n = self.state.dim();
        let lambda = self.params.lambda(n);

        // Cholesky decomposition: P = L * L^T
        // This gives us a "square root" of the covariance matrix.
        let l_matrix = Cholesky::new(self.state.covariance.clone())
            .ok_or(FilterError::CovarianceNotPositiveDefinite)?
            .l();
        let scaled_l = l_matrix * (n as f64 + lambda).sqrt();

        let mut sigma_points = DMatrix::zeros(n, 2 * n + 1);
        // First point is the mean.
        sigma_points.column_mut(0).copy_from(&self.state.vector);
        // The other 2n points are spread around the mean.
        for i in 0..n {
            sigma_points
                .column_mut(i + 1)
                .copy_from(&(self.state.vector.clone() + scaled_l.column(i)));
            sigma_points
                .column_mut(i + n + 1)
                .copy_from(&(self.state.vector.clone() - scaled_l.column(i)));
        }
        Ok(sigma_points)
    }

    /// Weighted mean of the columns of `points`, measured relative to the first column so
    /// that angles straddling ±π average correctly.
    fn weighted_mean(
        &self,
        points: &DMatrix<f64>,
        difference: impl Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64>,
    ) -> DVector<f64> {
        let anchor = points.column(0).into_owned();
        let mut offset = DVector::zeros(points.nrows());
        for i in 0..points.ncols() {
            offset += self.weights_m[i] * difference(&points.column(i).into_owned(), &anchor);
        }
        anchor + offset
    }
}

impl StateEstimator for UnscentedKalmanFilter {
    fn name(&self) -> &'static str {
        "UKF"
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
        let n = self.state.dim();
        let layout = &self.state.layout;

        // --- 1. Generate Sigma Points ---
        let sigma_points = self.generate_sigma_points()?;

        // --- 2. Propagate each point through the NON-LINEAR motion model ---
        let mut propagated_points = DMatrix::zeros(n, 2 * n + 1);
        for i in 0..(2 * n + 1) {
            let point = sigma_points.column(i).into_owned();
            propagated_points
                .column_mut(i)
                .copy_from(&motion_model.propagate(&point, dt));
        }

        // --- 3. Recover the predicted mean and covariance ---
        let x_pred = self.weighted_mean(&propagated_points, |a, b| state_difference(layout, a, b));
        let mut p_pred = DMatrix::zeros(n, n);
        for i in 0..(2 * n + 1) {
            let diff = state_difference(layout, &propagated_points.column(i).into_owned(), &x_pred);
            p_pred += self.weights_c[i] * &diff * diff.transpose();
        }
        p_pred += motion_model.get_process_noise(&self.state.vector, dt);

        let mut predicted = GaussianState {
            layout: layout.clone(),
            vector: x_pred,
            covariance: p_pred,
        };
        predicted.normalize_angles();
        predicted.symmetrize_covariance();
        if !predicted.is_finite() {
            return Err(FilterError::NumericalDivergence);
        }

        // --- 4. Update the state ---
        self.state = predicted;
        Ok(())
    }

    fn update(
        &mut self,
        measurement_model: &dyn MeasurementModel,
        z: &DVector<f64>,
    ) -> Result<f64, FilterError> {
        check_update(self.initialized, self.state.dim(), measurement_model, z)?;
        let n = self.state.dim();
        let m = z.nrows();
        let layout = &self.state.layout;

        // --- 1. Generate new sigma points from the PREDICTED state ---
        let sigma_points = self.generate_sigma_points()?;

        // --- 2. Propagate points through the NON-LINEAR measurement model ---
        let mut measurement_points = DMatrix::zeros(m, 2 * n + 1);
        for i in 0..(2 * n + 1) {
            let z_point = measurement_model.predict_measurement(&sigma_points.column(i).into_owned());
            measurement_points.column_mut(i).copy_from(&z_point);
        }

        // --- 3. Recover the predicted measurement and its covariance ---
        let z_pred = self.weighted_mean(&measurement_points, |a, b| measurement_model.residual(a, b));
        let mut s_cov = DMatrix::zeros(m, m);
        for i in 0..(2 * n + 1) {
            let diff = measurement_model.residual(&measurement_points.column(i).into_owned(), &z_pred);
            s_cov += self.weights_c[i] * &diff * diff.transpose();
        }
        s_cov += measurement_model.get_measurement_noise(); // Add measurement noise R

        // --- 4. Calculate cross-covariance and Kalman Gain ---
        let mut t_cov = DMatrix::zeros(n, m);
        for i in 0..(2 * n + 1) {
            let diff_x = state_difference(layout, &sigma_points.column(i).into_owned(), &self.state.vector);
            let diff_z = measurement_model.residual(&measurement_points.column(i).into_owned(), &z_pred);
            t_cov += self.weights_c[i] * &diff_x * diff_z.transpose();
        }

        if s_cov.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::SingularInnovation);
        }
        let s_inv = s_cov
            .clone()
            .cholesky()
            .ok_or(FilterError::SingularInnovation)?
            .inverse();
        let k_gain = t_cov * &s_inv;

        // --- 5. Update state and covariance ---
        let y = measurement_model.residual(z, &z_pred);
        let nis = y.dot(&(&s_inv * &y));

        let mut corrected = GaussianState {
            layout: layout.clone(),
            vector: &self.state.vector + &k_gain * &y,
            covariance: &self.state.covariance - &k_gain * s_cov * k_gain.transpose(),
        };
        corrected.normalize_angles();
        corrected.symmetrize_covariance();
        if !corrected.is_finite() || !nis.is_finite() {
            return Err(FilterError::NumericalDivergence);
        }

        self.state = corrected;
        Ok(nis)
    }

    fn get_state(&self) -> &GaussianState {
        &self.state
    }
}
