// fusion_core/src/error.rs

use thiserror::Error;

use crate::messages::SensorKind;

/// Everything that can go wrong inside the estimation core.
///
/// None of these are fatal to a replay: the orchestrator reports them per step and
/// keeps the last valid estimate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter has not been initialized")]
    NotInitialized,

    #[error("filter is already initialized")]
    AlreadyInitialized,

    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("time step must be non-negative, got {0} s")]
    NegativeTimeStep(f64),

    #[error("innovation covariance is singular or not finite")]
    SingularInnovation,

    #[error("state covariance is not positive definite")]
    CovarianceNotPositiveDefinite,

    #[error("update produced a non-finite state")]
    NumericalDivergence,

    #[error("state layout does not contain {0}")]
    UnsupportedLayout(&'static str),

    #[error("{sensor:?} measurement expects {expected} components, got {actual}")]
    InvalidMeasurement {
        sensor: SensorKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
