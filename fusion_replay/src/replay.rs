// fusion_replay/src/replay.rs

//! The replay loop: feed every parsed package to a [`FusionTracker`] in order and
//! write one estimate record per package.

use fusion_core::config::FusionConfig;
use fusion_core::fusion::{FusionTracker, StepOutcome, TrackerPhase};
use fusion_core::messages::{MeasurementPackage, SensorKind};
use nalgebra::Vector4;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::error::ReplayError;
use crate::evaluation::RmseAccumulator;
use crate::ingest::{read_packages, GROUND_TRUTH_MIN_LEN};
use crate::output::write_estimate;

/// Consistency figures for one sensor over a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct NisSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Share of updates whose NIS exceeded the 95 % χ² bound.
    pub fraction_above_95: Option<f64>,
}

/// What happened during a replay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplaySummary {
    /// Non-empty lines in the input.
    pub lines_read: usize,
    /// Lines that failed to parse.
    pub dropped_lines: usize,
    /// Packages handed to the tracker.
    pub packages_processed: usize,
    pub records_written: usize,
    /// Steps the tracker refused (out of order, singular innovation, ...).
    pub rejected_steps: usize,
    pub nis: BTreeMap<SensorKind, NisSummary>,
    /// RMSE over `[px, py, vx, vy]`, when the log carried ground truth.
    pub rmse: Option<Vector4<f64>>,
}

impl ReplaySummary {
    pub fn log(&self) {
        info!(
            lines = self.lines_read,
            dropped = self.dropped_lines,
            processed = self.packages_processed,
            written = self.records_written,
            rejected = self.rejected_steps,
            "replay finished"
        );
        for (sensor, nis) in &self.nis {
            if nis.count == 0 {
                continue;
            }
            info!(
                ?sensor,
                updates = nis.count,
                mean_nis = nis.mean.unwrap_or(f64::NAN),
                above_95 = nis.fraction_above_95.unwrap_or(f64::NAN),
                "NIS consistency"
            );
        }
        if let Some(rmse) = &self.rmse {
            info!(
                "RMSE: px={:.4} py={:.4} vx={:.4} vy={:.4}",
                rmse[0], rmse[1], rmse[2], rmse[3]
            );
        }
    }
}

fn ground_truth_cartesian(package: &MeasurementPackage) -> Option<Vector4<f64>> {
    let truth = package.ground_truth()?;
    if truth.len() < GROUND_TRUTH_MIN_LEN {
        return None;
    }
    Some(Vector4::new(truth[0], truth[1], truth[2], truth[3]))
}

/// Runs packages through an already-built tracker, writing estimates to `writer`.
pub fn replay_packages<W: Write>(
    tracker: &mut FusionTracker,
    packages: &[MeasurementPackage],
    writer: &mut W,
) -> Result<ReplaySummary, ReplayError> {
    let mut summary = ReplaySummary::default();
    let mut rmse = RmseAccumulator::new();

    for package in packages {
        let outcome = tracker.process_measurement(package);
        summary.packages_processed += 1;
        match &outcome {
            StepOutcome::Rejected { .. } => summary.rejected_steps += 1,
            StepOutcome::AwaitingInitialization => {
                debug!(timestamp = package.timestamp(), "no estimate yet");
            }
            _ => {}
        }

        // Every package gets a row so the output lines up with the input log; before
        // initialization the state is all zeros.
        write_estimate(
            writer,
            tracker.state().as_slice(),
            &package.cartesian_position(),
        )?;
        summary.records_written += 1;

        if tracker.phase() == TrackerPhase::Uninitialized {
            continue;
        }
        if let Some(truth) = ground_truth_cartesian(package) {
            rmse.add(&tracker.cartesian_estimate(), &truth);
        }
    }
    writer.flush()?;

    summary.nis = SensorKind::ALL
        .iter()
        .filter_map(|sensor| {
            let monitor = tracker.nis_monitor(*sensor)?;
            Some((
                *sensor,
                NisSummary {
                    count: monitor.count(),
                    mean: monitor.mean(),
                    fraction_above_95: monitor.fraction_above_95(),
                },
            ))
        })
        .collect();
    summary.rmse = rmse.rmse();
    Ok(summary)
}

/// Parses a whole log from `reader` and replays it with a fresh tracker.
pub fn run_replay<R: BufRead, W: Write>(
    config: FusionConfig,
    reader: R,
    writer: &mut W,
) -> Result<ReplaySummary, ReplayError> {
    let mut tracker = FusionTracker::new(config)?;
    info!(
        filter = tracker.filter_name(),
        motion = tracker.config().motion.name(),
        "starting replay"
    );

    let log = read_packages(reader)?;
    let mut summary = replay_packages(&mut tracker, &log.packages, writer)?;
    summary.lines_read = log.lines_read;
    summary.dropped_lines = log.dropped_lines;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::config::{FilterKind, MotionConfig};
    use std::io::Cursor;

    const LOG: &str = "\
L 1.0 1.0 0 1.0 1.0 1.0 0.0
R 1.5 0.75 1.0 50000 1.05 1.0 1.0 0.0
L 1.1 1.0 100000 1.1 1.0 1.0 0.0
not a measurement
R 1.6 0.7 1.0 150000 1.15 1.0 1.0 0.0
";

    fn records(buffer: Vec<u8>) -> Vec<Vec<String>> {
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|l| l.split('\t').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_replay_writes_one_record_per_package() {
        let mut out = Vec::new();
        let summary = run_replay(FusionConfig::default(), Cursor::new(LOG), &mut out).unwrap();

        assert_eq!(summary.lines_read, 5);
        assert_eq!(summary.dropped_lines, 1);
        assert_eq!(summary.packages_processed, 4);
        assert_eq!(summary.records_written, 4);
        assert_eq!(summary.rejected_steps, 0);

        let rows = records(out);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.len() == 7));
        // The first record is the seeded state followed by the lidar position.
        assert_eq!(rows[0], vec!["1", "1", "0", "0", "0", "1", "1"]);

        assert_eq!(summary.nis[&SensorKind::Laser].count, 1);
        assert_eq!(summary.nis[&SensorKind::Radar].count, 2);
        assert!(summary.rmse.is_some());
    }

    #[test]
    fn test_constant_velocity_records_are_six_wide() {
        let config = FusionConfig {
            filter: FilterKind::Ekf,
            motion: MotionConfig::default_cv(),
            ..FusionConfig::default()
        };
        let mut out = Vec::new();
        run_replay(config, Cursor::new(LOG), &mut out).unwrap();
        assert!(records(out).iter().all(|r| r.len() == 6));
    }

    #[test]
    fn test_out_of_order_package_is_counted_and_still_reported() {
        let log = "L 1.0 1.0 100000\nL 1.0 1.1 50000\nL 1.0 1.2 150000\n";
        let mut out = Vec::new();
        let summary = run_replay(FusionConfig::default(), Cursor::new(log), &mut out).unwrap();

        assert_eq!(summary.rejected_steps, 1);
        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.rmse, None);
    }

    #[test]
    fn test_packages_before_initialization_get_zero_rows() {
        let log = "L 0.0 0.0 0 1.0 1.0 1.0 0.0\n\
                   R 0.0 0.3 0.0 50000\n\
                   L 2.0 1.0 100000\n\
                   R 2.2 0.45 0.1 150000\n";
        let mut out = Vec::new();
        let summary = run_replay(FusionConfig::default(), Cursor::new(log), &mut out).unwrap();

        assert_eq!(summary.packages_processed, 4);
        assert_eq!(summary.records_written, 4);
        let rows = records(out);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec!["0", "0", "0", "0", "0", "0", "0"]);
        assert_eq!(rows[1][..5], ["0", "0", "0", "0", "0"]);
        assert_eq!(rows[2][..2], ["2", "1"]);
        // Ground truth seen while uninitialized does not feed the RMSE.
        assert_eq!(summary.rmse, None);
    }

    #[test]
    fn test_invalid_config_fails_before_reading() {
        let mut config = FusionConfig::default();
        config.lidar.std_px = 0.0;
        let mut out = Vec::new();
        assert!(matches!(
            run_replay(config, Cursor::new(LOG), &mut out),
            Err(ReplayError::InvalidConfig(_))
        ));
    }
}
