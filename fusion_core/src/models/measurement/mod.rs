// fusion_core/src/models/measurement/mod.rs

use dyn_clone::DynClone;
use nalgebra::{DMatrix, DVector};
use std::fmt::Debug;

use crate::error::FilterError;
use crate::messages::SensorKind;
use crate::types::State;

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
pub trait MeasurementModel: DynClone + Debug + Send + Sync {
    /// Which sensor's readings this model explains.
    fn sensor_kind(&self) -> SensorKind;

    /// Length of the state vector this model was built for.
    fn get_state_dim(&self) -> usize;

    /// Length of the measurement vector `z`.
    fn get_measurement_dim(&self) -> usize {
        self.sensor_kind().measurement_dim()
    }

    /// Predicts the ideal measurement `z_pred = h(x)` from a state vector.
    ///
    /// For nonlinear sensors this is the exact mapping, never `H·x`.
    fn predict_measurement(&self, x: &State) -> DVector<f64>;

    /// Calculates the measurement matrix `H = ∂h/∂x` at `x`.
    ///
    /// Linear sensors return a constant selection matrix. Only used to project the
    /// covariance.
    fn get_measurement_matrix(&self, x: &State) -> DMatrix<f64>;

    /// Returns the measurement noise covariance matrix `R`.
    fn get_measurement_noise(&self) -> &DMatrix<f64>;

    /// `z - z_pred`, with any angular component wrapped into (-π, π].
    fn residual(&self, z: &DVector<f64>, z_pred: &DVector<f64>) -> DVector<f64> {
        z - z_pred
    }
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn MeasurementModel>`.
dyn_clone::clone_trait_object!(MeasurementModel);

/// Builds `diag(σ₀², σ₁², ...)`, rejecting non-positive or non-finite sigmas.
pub fn diagonal_noise(sigmas: &[f64]) -> Result<DMatrix<f64>, FilterError> {
    if let Some(bad) = sigmas.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(FilterError::InvalidConfig(format!(
            "measurement std dev must be positive, got {bad}"
        )));
    }
    let variances = DVector::from_iterator(sigmas.len(), sigmas.iter().map(|s| s * s));
    Ok(DMatrix::from_diagonal(&variances))
}

pub mod lidar;
pub mod radar;

pub use lidar::LidarModel;
pub use radar::RadarModel;
