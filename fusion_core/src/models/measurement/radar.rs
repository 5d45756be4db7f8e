// fusion_core/src/models/measurement/radar.rs

use nalgebra::{DMatrix, DVector};

use crate::error::FilterError;
use crate::messages::SensorKind;
use crate::models::measurement::{diagonal_noise, MeasurementModel};
use crate::state::{KinematicIndices, StateVariable, VelocityIndices};
use crate::types::State;
use crate::utils::angles::wrap_angle;

/// Ranges below this are clamped before dividing by them.
pub const MIN_RANGE: f64 = 1.0e-4;

/// A radar reports range, bearing and range rate from the sensor origin.
///
/// `h(x) = [ρ, atan2(py, px), (px·vx + py·vy) / ρ]`. The mapping is nonlinear, so the
/// predicted measurement always comes from `h` itself and `H` is the Jacobian at `x`.
#[derive(Debug, Clone)]
pub struct RadarModel {
    indices: KinematicIndices,
    noise_covariance: DMatrix<f64>,
}

impl RadarModel {
    pub fn new(
        layout: &[StateVariable],
        std_rho: f64,
        std_phi: f64,
        std_rho_dot: f64,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            indices: KinematicIndices::from_layout(layout)?,
            noise_covariance: diagonal_noise(&[std_rho, std_phi, std_rho_dot])?,
        })
    }
}

impl MeasurementModel for RadarModel {
    fn sensor_kind(&self) -> SensorKind {
        SensorKind::Radar
    }

    fn get_state_dim(&self) -> usize {
        self.indices.dim
    }

    fn predict_measurement(&self, x: &State) -> DVector<f64> {
        let p = self.indices.position(x);
        let v = self.indices.velocity(x);

        let rho = p.norm().max(MIN_RANGE);
        let phi = p.y.atan2(p.x);
        let rho_dot = p.dot(&v) / rho;

        DVector::from_vec(vec![rho, phi, rho_dot])
    }

    fn get_measurement_matrix(&self, x: &State) -> DMatrix<f64> {
        let idx = &self.indices;
        let p = idx.position(x);
        let v = idx.velocity(x);
        let (px, py) = (p.x, p.y);
        let (vx, vy) = (v.x, v.y);

        let rho = p.norm().max(MIN_RANGE);
        let rho2 = rho * rho;
        let rho3 = rho2 * rho;

        let mut h = DMatrix::zeros(3, idx.dim);

        // Range
        h[(0, idx.px)] = px / rho;
        h[(0, idx.py)] = py / rho;
        // Bearing
        h[(1, idx.px)] = -py / rho2;
        h[(1, idx.py)] = px / rho2;
        // Range rate, position part
        h[(2, idx.px)] = py * (vx * py - vy * px) / rho3;
        h[(2, idx.py)] = px * (vy * px - vx * py) / rho3;

        // Range rate, velocity part
        match idx.velocity {
            VelocityIndices::Cartesian { vx: ivx, vy: ivy } => {
                h[(2, ivx)] = px / rho;
                h[(2, ivy)] = py / rho;
            }
            VelocityIndices::Polar { speed, yaw } => {
                let (s, c) = x[yaw].sin_cos();
                h[(2, speed)] = (px * c + py * s) / rho;
                h[(2, yaw)] = x[speed] * (py * c - px * s) / rho;
            }
            VelocityIndices::Absent => {}
        }

        h
    }

    fn get_measurement_noise(&self) -> &DMatrix<f64> {
        &self.noise_covariance
    }

    fn residual(&self, z: &DVector<f64>, z_pred: &DVector<f64>) -> DVector<f64> {
        let mut y = z - z_pred;
        y[1] = wrap_angle(y[1]);
        y
    }
}
