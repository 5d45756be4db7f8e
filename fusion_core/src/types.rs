// fusion_core/src/types.rs

use nalgebra::{DMatrix, DVector};

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Covariance = DMatrix<f64>;

/// Conversion factor for the microsecond timestamps carried by measurement logs.
pub const MICROSECONDS_TO_SECONDS: f64 = 1.0e-6;

/// Anything with a norm at or below this is treated as zero.
pub const ZERO_EPSILON: f64 = 1.0e-3;

/// Returns `true` when `value` is meaningfully different from zero.
pub fn is_not_zero(value: f64) -> bool {
    value.abs() > ZERO_EPSILON
}
