// fusion_core/src/messages.rs

use nalgebra::{DVector, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

// =========================================================================
// == Sensor Identification ==
// =========================================================================

/// The kind of sensor a measurement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Lidar: cartesian position `[px, py]`.
    Laser,
    /// Radar: polar reading `[rho, phi, rho_dot]`.
    Radar,
}

impl SensorKind {
    pub const ALL: [SensorKind; 2] = [SensorKind::Laser, SensorKind::Radar];

    /// Number of components in a raw measurement from this sensor.
    pub fn measurement_dim(self) -> usize {
        match self {
            SensorKind::Laser => 2,
            SensorKind::Radar => 3,
        }
    }

    /// The single-letter tag used in measurement logs.
    pub fn tag(self) -> &'static str {
        match self {
            SensorKind::Laser => "L",
            SensorKind::Radar => "R",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "L" => Some(SensorKind::Laser),
            "R" => Some(SensorKind::Radar),
            _ => None,
        }
    }
}

// =========================================================================
// == Measurement Package ==
// =========================================================================

/// One timestamped reading from a single sensor.
///
/// The raw vector always has exactly [`SensorKind::measurement_dim`] components; the
/// constructors enforce this so the filter never sees a malformed reading.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementPackage {
    sensor: SensorKind,
    raw: DVector<f64>,
    /// Microseconds.
    timestamp: u64,
    ground_truth: Option<DVector<f64>>,
}

impl MeasurementPackage {
    pub fn new(sensor: SensorKind, raw: DVector<f64>, timestamp: u64) -> Result<Self, FilterError> {
        let expected = sensor.measurement_dim();
        if raw.len() != expected {
            return Err(FilterError::InvalidMeasurement {
                sensor,
                expected,
                actual: raw.len(),
            });
        }
        Ok(Self {
            sensor,
            raw,
            timestamp,
            ground_truth: None,
        })
    }

    pub fn laser(px: f64, py: f64, timestamp: u64) -> Self {
        Self {
            sensor: SensorKind::Laser,
            raw: DVector::from_vec(vec![px, py]),
            timestamp,
            ground_truth: None,
        }
    }

    pub fn radar(rho: f64, phi: f64, rho_dot: f64, timestamp: u64) -> Self {
        Self {
            sensor: SensorKind::Radar,
            raw: DVector::from_vec(vec![rho, phi, rho_dot]),
            timestamp,
            ground_truth: None,
        }
    }

    /// Attaches the reference state `[px, py, vx, vy, ...]` recorded alongside the reading.
    pub fn with_ground_truth(mut self, ground_truth: DVector<f64>) -> Self {
        self.ground_truth = Some(ground_truth);
        self
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    pub fn raw(&self) -> &DVector<f64> {
        &self.raw
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn ground_truth(&self) -> Option<&DVector<f64>> {
        self.ground_truth.as_ref()
    }

    /// The measured position expressed in cartesian coordinates.
    pub fn cartesian_position(&self) -> Vector2<f64> {
        match self.sensor {
            SensorKind::Laser => Vector2::new(self.raw[0], self.raw[1]),
            SensorKind::Radar => {
                let (rho, phi) = (self.raw[0], self.raw[1]);
                Vector2::new(rho * phi.cos(), rho * phi.sin())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_new_rejects_wrong_dimension() {
        let err = MeasurementPackage::new(SensorKind::Radar, DVector::from_vec(vec![1.0, 2.0]), 0)
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidMeasurement {
                sensor: SensorKind::Radar,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_radar_cartesian_position() {
        let pkg = MeasurementPackage::radar(2.0, FRAC_PI_2, 0.0, 10);
        let p = pkg.cartesian_position();
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tags_round_trip() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(SensorKind::from_tag("X"), None);
    }
}
