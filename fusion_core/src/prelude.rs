// fusion_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::estimation::StateEstimator;
pub use crate::models::measurement::MeasurementModel;
pub use crate::models::motion::MotionModel;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::error::FilterError;
pub use crate::messages::{MeasurementPackage, SensorKind};
pub use crate::state::{GaussianState, KinematicIndices, StateVariable};
pub use crate::types::{Covariance, State};

// --- Estimation Algorithms ---
pub use crate::estimation::consistency::{chi_square_95, NisMonitor};
pub use crate::estimation::filters::ekf::{ekf_predict, ekf_update};
pub use crate::estimation::{ExtendedKalmanFilter, UkfParams, UnscentedKalmanFilter};

// --- Orchestration ---
pub use crate::config::{FilterKind, FusionConfig, LidarConfig, MotionConfig, RadarConfig};
pub use crate::fusion::{FusionTracker, StepOutcome, TrackerPhase};

// --- Concrete Model Implementations (Export common ones for convenience) ---
pub use crate::models::measurement::{LidarModel, RadarModel};
pub use crate::models::motion::{ConstantVelocityModel, CtrvModel};
pub use crate::utils::angles::{angle_difference, wrap_angle};
