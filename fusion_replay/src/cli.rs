// fusion_replay/src/cli.rs

use clap::{Parser, ValueEnum};
use fusion_core::config::FilterKind;
use std::path::PathBuf;

/// Replays a lidar/radar measurement log through a Kalman fusion tracker.
///
/// Each processed measurement produces one tab-separated line in OUTPUT: the full
/// state vector followed by the measured position in cartesian coordinates.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The measurement log to replay.
    #[arg(required_unless_present = "print_config")]
    pub input: Option<PathBuf>,

    /// Where the estimates are written.
    #[arg(required_unless_present = "print_config")]
    pub output: Option<PathBuf>,

    /// A TOML file layered over the built-in defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Which filter core to run.
    #[arg(long, value_enum)]
    pub filter: Option<FilterArg>,

    /// Which motion model to predict with.
    #[arg(long, value_enum)]
    pub motion: Option<MotionArg>,

    /// Ignore lidar readings (they still advance the filter in time).
    #[arg(long, default_value_t = false)]
    pub no_laser: bool,

    /// Ignore radar readings (they still advance the filter in time).
    #[arg(long, default_value_t = false)]
    pub no_radar: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterArg {
    Ekf,
    Ukf,
}

impl From<FilterArg> for FilterKind {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Ekf => FilterKind::Ekf,
            FilterArg::Ukf => FilterKind::Ukf,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionArg {
    /// Constant turn rate and velocity.
    Ctrv,
    /// Constant velocity.
    Cv,
}

impl MotionArg {
    pub fn name(self) -> &'static str {
        match self {
            MotionArg::Ctrv => "ctrv",
            MotionArg::Cv => "cv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_positionals_are_required() {
        assert!(Cli::try_parse_from(["fusion_replay", "in.txt"]).is_err());
        assert!(Cli::try_parse_from(["fusion_replay", "a", "b", "c"]).is_err());

        let cli = Cli::try_parse_from(["fusion_replay", "in.txt", "out.txt"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("in.txt")));
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
        assert!(!cli.no_laser && !cli.no_radar);
    }

    #[test]
    fn test_overrides_parse() {
        let cli = Cli::try_parse_from([
            "fusion_replay",
            "in.txt",
            "out.txt",
            "--filter",
            "ekf",
            "--motion",
            "cv",
            "--no-radar",
        ])
        .unwrap();
        assert_eq!(cli.filter, Some(FilterArg::Ekf));
        assert_eq!(cli.motion, Some(MotionArg::Cv));
        assert!(cli.no_radar);
    }

    #[test]
    fn test_print_config_needs_no_files() {
        let cli = Cli::try_parse_from(["fusion_replay", "--print-config"]).unwrap();
        assert!(cli.print_config);
        assert_eq!(cli.input, None);
    }
}
