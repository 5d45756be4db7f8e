// fusion_core/src/models/measurement/lidar.rs

use nalgebra::{DMatrix, DVector};

use crate::error::FilterError;
use crate::messages::SensorKind;
use crate::models::measurement::{diagonal_noise, MeasurementModel};
use crate::state::{KinematicIndices, StateVariable};
use crate::types::State;

/// A lidar reports the object's cartesian position directly. `h(x) = [px, py]`.
#[derive(Debug, Clone)]
pub struct LidarModel {
    indices: KinematicIndices,
    // The R matrix for this sensor
    noise_covariance: DMatrix<f64>,
}

impl LidarModel {
    pub fn new(layout: &[StateVariable], std_px: f64, std_py: f64) -> Result<Self, FilterError> {
        Ok(Self {
            indices: KinematicIndices::from_layout(layout)?,
            noise_covariance: diagonal_noise(&[std_px, std_py])?,
        })
    }
}

impl MeasurementModel for LidarModel {
    fn sensor_kind(&self) -> SensorKind {
        SensorKind::Laser
    }

    fn get_state_dim(&self) -> usize {
        self.indices.dim
    }

    fn predict_measurement(&self, x: &State) -> DVector<f64> {
        let p = self.indices.position(x);
        DVector::from_vec(vec![p.x, p.y])
    }

    fn get_measurement_matrix(&self, _x: &State) -> DMatrix<f64> {
        // The matrix H must be size (measurement_dims x state_dims)
        let mut h = DMatrix::zeros(2, self.indices.dim);
        h[(0, self.indices.px)] = 1.0;
        h[(1, self.indices.py)] = 1.0;
        h
    }

    fn get_measurement_noise(&self) -> &DMatrix<f64> {
        &self.noise_covariance
    }
}
