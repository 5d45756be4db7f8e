// fusion_core/src/estimation/mod.rs

use dyn_clone::DynClone;
use nalgebra::DVector;
use std::fmt::Debug;

use crate::error::FilterError;
use crate::models::measurement::MeasurementModel;
use crate::models::motion::MotionModel;
use crate::state::GaussianState;
use crate::types::State;

/// The contract for any algorithm that performs the "filter core" role: it owns one
/// Gaussian belief and moves it forward in time and through measurements.
///
/// Failed steps return an error and leave the belief exactly as it was.
pub trait StateEstimator: DynClone + Debug + Send + Sync {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Sets the mean. The covariance keeps the prior configured at construction.
    fn initialize(&mut self, initial_state: State) -> Result<(), FilterError>;

    fn is_initialized(&self) -> bool;

    /// Time update over `dt` seconds. `dt = 0` leaves the belief unchanged.
    fn predict(&mut self, motion_model: &dyn MotionModel, dt: f64) -> Result<(), FilterError>;

    /// Measurement update. Returns the normalized innovation squared `yᵗ·S⁻¹·y`.
    fn update(
        &mut self,
        measurement_model: &dyn MeasurementModel,
        z: &DVector<f64>,
    ) -> Result<f64, FilterError>;

    /// Returns a reference to the current best estimate of the state.
    fn get_state(&self) -> &GaussianState;
}

dyn_clone::clone_trait_object!(StateEstimator);

/// Shared precondition checks for every filter variant.
pub(crate) fn check_predict(initialized: bool, dt: f64) -> Result<(), FilterError> {
    if !initialized {
        return Err(FilterError::NotInitialized);
    }
    if !dt.is_finite() || dt < 0.0 {
        return Err(FilterError::NegativeTimeStep(dt));
    }
    Ok(())
}

pub(crate) fn check_update(
    initialized: bool,
    state_dim: usize,
    measurement_model: &dyn MeasurementModel,
    z: &DVector<f64>,
) -> Result<(), FilterError> {
    if !initialized {
        return Err(FilterError::NotInitialized);
    }
    if measurement_model.get_state_dim() != state_dim {
        return Err(FilterError::DimensionMismatch {
            what: "measurement model state",
            expected: state_dim,
            actual: measurement_model.get_state_dim(),
        });
    }
    let expected = measurement_model.get_measurement_dim();
    if z.len() != expected {
        return Err(FilterError::DimensionMismatch {
            what: "measurement vector",
            expected,
            actual: z.len(),
        });
    }
    if z.iter().any(|v| !v.is_finite()) {
        return Err(FilterError::NumericalDivergence);
    }
    Ok(())
}

pub mod consistency;
pub mod filters;

pub use filters::ekf::ExtendedKalmanFilter;
pub use filters::ukf::{UkfParams, UnscentedKalmanFilter};
