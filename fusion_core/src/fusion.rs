// fusion_core/src/fusion.rs

//! The fusion orchestrator: one tracked object, one filter, one model per sensor.

use nalgebra::{DVector, Vector4};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::FusionConfig;
use crate::error::FilterError;
use crate::estimation::consistency::NisMonitor;
use crate::estimation::StateEstimator;
use crate::messages::{MeasurementPackage, SensorKind};
use crate::models::measurement::{LidarModel, MeasurementModel, RadarModel};
use crate::models::motion::MotionModel;
use crate::state::KinematicIndices;
use crate::types::{is_not_zero, Covariance, State, MICROSECONDS_TO_SECONDS};

/// Lifecycle of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// Waiting for a usable first reading.
    Uninitialized,
    /// The filter holds a belief and every package runs predict (+ update).
    Initialized,
}

/// What happened to one measurement package.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The package seeded the filter; no predict or update ran.
    Initialized,
    /// The package was too degenerate to seed the filter.
    AwaitingInitialization,
    /// Predict and update ran; `nis` is the update's consistency score.
    Updated { sensor: SensorKind, nis: f64 },
    /// The sensor is disabled, so only the time update ran.
    PredictedOnly { sensor: SensorKind },
    /// The step was refused and the estimate is unchanged since the last good step.
    Rejected { sensor: SensorKind, reason: FilterError },
}

/// Owns the filter core, the motion model and one measurement model per sensor, and
/// drives them from a stream of [`MeasurementPackage`]s.
#[derive(Debug, Clone)]
pub struct FusionTracker {
    config: FusionConfig,
    estimator: Box<dyn StateEstimator>,
    motion_model: Box<dyn MotionModel>,
    // A map from a sensor kind to its specific measurement model.
    measurement_models: BTreeMap<SensorKind, Box<dyn MeasurementModel>>,
    indices: KinematicIndices,
    phase: TrackerPhase,
    /// Microseconds.
    previous_timestamp: u64,
    nis: BTreeMap<SensorKind, NisMonitor>,
}

impl FusionTracker {
    pub fn new(config: FusionConfig) -> Result<Self, FilterError> {
        config.validate()?;

        let motion_model = config.motion.build();
        let layout = motion_model.get_state_layout();

        let mut measurement_models: BTreeMap<SensorKind, Box<dyn MeasurementModel>> = BTreeMap::new();
        measurement_models.insert(
            SensorKind::Laser,
            Box::new(LidarModel::new(&layout, config.lidar.std_px, config.lidar.std_py)?),
        );
        measurement_models.insert(
            SensorKind::Radar,
            Box::new(RadarModel::new(
                &layout,
                config.radar.std_rho,
                config.radar.std_phi,
                config.radar.std_rho_dot,
            )?),
        );

        let indices = KinematicIndices::from_layout(&layout)?;
        let estimator = config.build_estimator(layout)?;

        debug!(
            filter = estimator.name(),
            motion = config.motion.name(),
            use_laser = config.use_laser,
            use_radar = config.use_radar,
            "fusion tracker created"
        );

        Ok(Self {
            nis: Self::fresh_monitors(),
            config,
            estimator,
            motion_model,
            measurement_models,
            indices,
            phase: TrackerPhase::Uninitialized,
            previous_timestamp: 0,
        })
    }

    fn fresh_monitors() -> BTreeMap<SensorKind, NisMonitor> {
        SensorKind::ALL
            .iter()
            .map(|kind| (*kind, NisMonitor::new(kind.measurement_dim())))
            .collect()
    }

    /// Drops the current belief and statistics; the next package re-seeds the filter.
    pub fn reset(&mut self) -> Result<(), FilterError> {
        self.estimator = self
            .config
            .build_estimator(self.motion_model.get_state_layout())?;
        self.phase = TrackerPhase::Uninitialized;
        self.previous_timestamp = 0;
        self.nis = Self::fresh_monitors();
        Ok(())
    }

    pub fn is_enabled(&self, sensor: SensorKind) -> bool {
        match sensor {
            SensorKind::Laser => self.config.use_laser,
            SensorKind::Radar => self.config.use_radar,
        }
    }

    /// Runs one package through the state machine.
    pub fn process_measurement(&mut self, package: &MeasurementPackage) -> StepOutcome {
        if self.phase == TrackerPhase::Uninitialized {
            return self.initialize(package);
        }

        let sensor = package.sensor();
        let timestamp = package.timestamp();
        if timestamp < self.previous_timestamp {
            let dt = -((self.previous_timestamp - timestamp) as f64) * MICROSECONDS_TO_SECONDS;
            warn!(
                ?sensor,
                timestamp,
                previous = self.previous_timestamp,
                "measurement out of order, skipping"
            );
            return StepOutcome::Rejected {
                sensor,
                reason: FilterError::NegativeTimeStep(dt),
            };
        }

        // 1. PREDICT: Advance the state to the exact time of the measurement.
        let dt = (timestamp - self.previous_timestamp) as f64 * MICROSECONDS_TO_SECONDS;
        if let Err(reason) = self.estimator.predict(self.motion_model.as_ref(), dt) {
            warn!(?sensor, timestamp, dt, %reason, "predict rejected");
            return StepOutcome::Rejected { sensor, reason };
        }
        self.previous_timestamp = timestamp;

        if !self.is_enabled(sensor) {
            return StepOutcome::PredictedOnly { sensor };
        }

        // 2. UPDATE: Now that we're at the correct time, fuse the measurement.
        let Some(model) = self.measurement_models.get(&sensor) else {
            return StepOutcome::PredictedOnly { sensor };
        };
        match self.estimator.update(model.as_ref(), package.raw()) {
            Ok(nis) => {
                if let Some(monitor) = self.nis.get_mut(&sensor) {
                    monitor.record(nis);
                }
                StepOutcome::Updated { sensor, nis }
            }
            Err(reason) => {
                warn!(?sensor, timestamp, %reason, "update rejected, keeping prediction");
                StepOutcome::Rejected { sensor, reason }
            }
        }
    }

    /// Seeds the filter with the measured position; velocity, heading and yaw rate start
    /// at zero.
    fn initialize(&mut self, package: &MeasurementPackage) -> StepOutcome {
        let sensor = package.sensor();
        let position = package.cartesian_position();

        let mut x0 = DVector::zeros(self.indices.dim);
        x0[self.indices.px] = position.x;
        x0[self.indices.py] = position.y;

        if !is_not_zero(x0.norm()) {
            debug!(?sensor, timestamp = package.timestamp(), "degenerate first reading, still waiting");
            return StepOutcome::AwaitingInitialization;
        }

        if let Err(reason) = self.estimator.initialize(x0) {
            warn!(?sensor, %reason, "initialization rejected");
            return StepOutcome::Rejected { sensor, reason };
        }
        self.previous_timestamp = package.timestamp();
        self.phase = TrackerPhase::Initialized;
        debug!(
            ?sensor,
            timestamp = package.timestamp(),
            px = position.x,
            py = position.y,
            "tracker initialized"
        );
        StepOutcome::Initialized
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Name of the filter core in use ("EKF" or "UKF").
    pub fn filter_name(&self) -> &'static str {
        self.estimator.name()
    }

    /// The latest full state vector.
    pub fn state(&self) -> &State {
        &self.estimator.get_state().vector
    }

    pub fn covariance(&self) -> &Covariance {
        &self.estimator.get_state().covariance
    }

    /// The estimate as `[px, py, vx, vy]`, whatever the motion model's layout.
    pub fn cartesian_estimate(&self) -> Vector4<f64> {
        self.indices.cartesian(self.state())
    }

    /// Timestamp (microseconds) of the last package that advanced the filter.
    pub fn previous_timestamp(&self) -> u64 {
        self.previous_timestamp
    }

    /// The most recent NIS for `sensor`.
    pub fn nis(&self, sensor: SensorKind) -> Option<f64> {
        self.nis.get(&sensor).and_then(NisMonitor::latest)
    }

    pub fn nis_monitor(&self, sensor: SensorKind) -> Option<&NisMonitor> {
        self.nis.get(&sensor)
    }
}
