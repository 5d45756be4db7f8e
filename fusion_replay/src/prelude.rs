// fusion_replay/src/prelude.rs

// Re-export the entire fusion_core prelude so the pure types are one import away.
pub use fusion_core::prelude::*;

// Replay-specific types.
pub use crate::cli::Cli;
pub use crate::config::{load_config, render_config};
pub use crate::error::{ParseError, ReplayError};
pub use crate::evaluation::RmseAccumulator;
pub use crate::ingest::{parse_line, read_packages, ParsedLog};
pub use crate::output::write_estimate;
pub use crate::replay::{replay_packages, run_replay, NisSummary, ReplaySummary};
