// fusion_core/src/config.rs

//! Serializable configuration for a fusion run. The replay crate layers these from
//! defaults, a TOML file and the environment; everything here is plain data.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::estimation::{ExtendedKalmanFilter, StateEstimator, UkfParams, UnscentedKalmanFilter};
use crate::models::motion::{ConstantVelocityModel, CtrvModel, MotionModel};
use crate::state::StateVariable;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FusionConfig {
    /// Fuse lidar readings. Disabled sensors still advance the filter in time.
    pub use_laser: bool,
    /// Fuse radar readings.
    pub use_radar: bool,
    pub filter: FilterKind,
    /// Diagonal value of the prior covariance `P₀`.
    pub initial_covariance: f64,
    pub motion: MotionConfig,
    pub lidar: LidarConfig,
    pub radar: RadarConfig,
    pub ukf: UkfParams,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            use_laser: true,
            use_radar: true,
            filter: FilterKind::Ukf,
            initial_covariance: 1.0,
            motion: MotionConfig::default(),
            lidar: LidarConfig::default(),
            radar: RadarConfig::default(),
            ukf: UkfParams::default(),
        }
    }
}

impl FusionConfig {
    /// Rejects values no filter can work with. Sensor sigmas are checked again when the
    /// models are built.
    pub fn validate(&self) -> Result<(), FilterError> {
        fn positive(name: &str, value: f64) -> Result<(), FilterError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(FilterError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }

        positive("initial_covariance", self.initial_covariance)?;
        match self.motion {
            MotionConfig::Ctrv { std_a, std_yaw_dd } => {
                positive("motion.std_a", std_a)?;
                positive("motion.std_yaw_dd", std_yaw_dd)?;
            }
            MotionConfig::Cv { noise_ax, noise_ay } => {
                positive("motion.noise_ax", noise_ax)?;
                positive("motion.noise_ay", noise_ay)?;
            }
        }
        positive("lidar.std_px", self.lidar.std_px)?;
        positive("lidar.std_py", self.lidar.std_py)?;
        positive("radar.std_rho", self.radar.std_rho)?;
        positive("radar.std_phi", self.radar.std_phi)?;
        positive("radar.std_rho_dot", self.radar.std_rho_dot)?;
        if self.filter == FilterKind::Ukf {
            positive("ukf.alpha", self.ukf.alpha)?;
        }
        Ok(())
    }

    /// The "Factory" logic for the filter core.
    pub fn build_estimator(
        &self,
        layout: Vec<StateVariable>,
    ) -> Result<Box<dyn StateEstimator>, FilterError> {
        Ok(match self.filter {
            FilterKind::Ekf => Box::new(ExtendedKalmanFilter::new(layout, self.initial_covariance)),
            FilterKind::Ukf => Box::new(UnscentedKalmanFilter::new(
                layout,
                self.initial_covariance,
                self.ukf,
            )?),
        })
    }
}

// =========================================================================
// == Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Ekf,
    Ukf,
}

/// Selects the motion model. Omitted noise values fall back to the model defaults, but
/// keys belonging to the other variant are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)] // `type = "ctrv"` picks the variant
pub enum MotionConfig {
    Ctrv {
        #[serde(default = "default_std_a")]
        std_a: f64,
        #[serde(default = "default_std_yaw_dd")]
        std_yaw_dd: f64,
    },
    Cv {
        #[serde(default = "default_noise_ax")]
        noise_ax: f64,
        #[serde(default = "default_noise_ay")]
        noise_ay: f64,
    },
}

fn default_std_a() -> f64 {
    CtrvModel::default().std_a
}

fn default_std_yaw_dd() -> f64 {
    CtrvModel::default().std_yaw_dd
}

fn default_noise_ax() -> f64 {
    ConstantVelocityModel::default().noise_ax
}

fn default_noise_ay() -> f64 {
    ConstantVelocityModel::default().noise_ay
}

impl Default for MotionConfig {
    fn default() -> Self {
        let ctrv = CtrvModel::default();
        MotionConfig::Ctrv {
            std_a: ctrv.std_a,
            std_yaw_dd: ctrv.std_yaw_dd,
        }
    }
}

impl MotionConfig {
    /// The constant-velocity variant with its default noise.
    pub fn default_cv() -> Self {
        let cv = ConstantVelocityModel::default();
        MotionConfig::Cv {
            noise_ax: cv.noise_ax,
            noise_ay: cv.noise_ay,
        }
    }

    pub fn build(&self) -> Box<dyn MotionModel> {
        match *self {
            MotionConfig::Ctrv { std_a, std_yaw_dd } => Box::new(CtrvModel { std_a, std_yaw_dd }),
            MotionConfig::Cv { noise_ax, noise_ay } => {
                Box::new(ConstantVelocityModel { noise_ax, noise_ay })
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MotionConfig::Ctrv { .. } => "ctrv",
            MotionConfig::Cv { .. } => "cv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LidarConfig {
    pub std_px: f64, // [m]
    pub std_py: f64, // [m]
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            std_px: 0.15,
            std_py: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RadarConfig {
    pub std_rho: f64,     // [m]
    pub std_phi: f64,     // [rad]
    pub std_rho_dot: f64, // [m/s]
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            std_rho: 0.3,
            std_phi: 0.03,
            std_rho_dot: 0.3,
        }
    }
}
