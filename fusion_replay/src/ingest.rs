// fusion_replay/src/ingest.rs

//! Parsing of whitespace-separated measurement logs:
//!
//! ```text
//! L  px  py             timestamp [px_gt py_gt vx_gt vy_gt ...]
//! R  rho theta rho_dot  timestamp [px_gt py_gt vx_gt vy_gt ...]
//! ```

use fusion_core::messages::{MeasurementPackage, SensorKind};
use nalgebra::DVector;
use std::io::BufRead;
use tracing::debug;

use crate::error::{ParseError, ReplayError};

/// Ground truth is only kept when it covers at least `[px, py, vx, vy]`.
pub const GROUND_TRUTH_MIN_LEN: usize = 4;

fn parse_f64(index: usize, value: &str) -> Result<f64, ParseError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber {
            index,
            value: value.to_string(),
        }),
    }
}

/// Parses one log line into a measurement package.
pub fn parse_line(line: &str) -> Result<MeasurementPackage, ParseError> {
    let mut fields = line.split_whitespace();
    let tag = fields.next().ok_or(ParseError::Empty)?;
    let sensor =
        SensorKind::from_tag(tag).ok_or_else(|| ParseError::UnknownSensor(tag.to_string()))?;

    let rest: Vec<&str> = fields.collect();
    let dim = sensor.measurement_dim();
    if rest.len() < dim + 1 {
        return Err(ParseError::MissingFields {
            expected: dim + 1,
            actual: rest.len(),
        });
    }

    let raw = rest[..dim]
        .iter()
        .enumerate()
        .map(|(i, v)| parse_f64(i + 1, v))
        .collect::<Result<Vec<f64>, _>>()?;
    let timestamp: u64 = rest[dim].parse().map_err(|_| ParseError::InvalidNumber {
        index: dim + 1,
        value: rest[dim].to_string(),
    })?;

    let package = MeasurementPackage::new(sensor, DVector::from_vec(raw), timestamp)?;

    let truth = &rest[dim + 1..];
    if truth.len() < GROUND_TRUTH_MIN_LEN {
        return Ok(package);
    }
    let truth = truth
        .iter()
        .enumerate()
        .map(|(i, v)| parse_f64(dim + 2 + i, v))
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(package.with_ground_truth(DVector::from_vec(truth)))
}

/// The packages of a log plus the bookkeeping of what was skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub packages: Vec<MeasurementPackage>,
    pub lines_read: usize,
    pub dropped_lines: usize,
}

/// Reads every line, keeping well-formed packages in order. Malformed lines are
/// logged and counted, never fatal; only I/O failures are.
pub fn read_packages<R: BufRead>(reader: R) -> Result<ParsedLog, ReplayError> {
    let mut log = ParsedLog::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        log.lines_read += 1;
        match parse_line(&line) {
            Ok(package) => log.packages.push(package),
            Err(e) => {
                debug!(line = line_no + 1, error = %e, "dropping malformed log line");
                log.dropped_lines += 1;
            }
        }
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    #[test]
    fn test_parse_lidar_line() {
        let pkg = parse_line("L\t3.122427e-01\t5.803398e-01\t1477010443000000").unwrap();
        assert_eq!(pkg.sensor(), SensorKind::Laser);
        assert_eq!(pkg.timestamp(), 1_477_010_443_000_000);
        assert_abs_diff_eq!(pkg.raw()[0], 0.3122427, epsilon = 1e-12);
        assert_abs_diff_eq!(pkg.raw()[1], 0.5803398, epsilon = 1e-12);
        assert!(pkg.ground_truth().is_none());
    }

    #[test]
    fn test_parse_radar_line_with_ground_truth() {
        let pkg = parse_line(
            "R 1.014892e+00 5.543292e-01 4.892807e+00 1477010443050000 8.6e-01 6.0e-01 5.2e+00 1.8e-03 0.1 0.2",
        )
        .unwrap();
        assert_eq!(pkg.sensor(), SensorKind::Radar);
        assert_eq!(pkg.raw().len(), 3);
        let truth = pkg.ground_truth().unwrap();
        assert_eq!(truth.len(), 6);
        assert_abs_diff_eq!(truth[2], 5.2, epsilon = 1e-12);
    }

    #[test]
    fn test_short_ground_truth_is_ignored() {
        let pkg = parse_line("L 1.0 2.0 100 1.0 2.0").unwrap();
        assert!(pkg.ground_truth().is_none());
    }

    #[test]
    fn test_malformed_lines_are_errors() {
        assert_eq!(parse_line("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_line("X 1 2 3"),
            Err(ParseError::UnknownSensor("X".to_string()))
        );
        assert_eq!(
            parse_line("R 1.0 0.5 100"),
            Err(ParseError::MissingFields {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            parse_line("L 1.0 abc 100"),
            Err(ParseError::InvalidNumber { index: 2, .. })
        ));
        // Negative timestamps are not valid microsecond counts.
        assert!(matches!(
            parse_line("L 1.0 2.0 -5"),
            Err(ParseError::InvalidNumber { index: 3, .. })
        ));
        assert!(matches!(
            parse_line("L NaN 2.0 5"),
            Err(ParseError::InvalidNumber { index: 1, .. })
        ));
    }

    #[test]
    fn test_read_packages_skips_bad_lines() {
        let input = "L 1.0 2.0 0\n\
                     garbage line\n\
                     \n\
                     R 2.0 0.1 0.5 50000\n\
                     L 1.0\n";
        let log = read_packages(Cursor::new(input)).unwrap();

        assert_eq!(log.lines_read, 4);
        assert_eq!(log.dropped_lines, 2);
        assert_eq!(log.packages.len(), 2);
        assert_eq!(log.packages[1].timestamp(), 50_000);
    }
}
