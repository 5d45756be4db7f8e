// fusion_replay/src/lib.rs

// This prelude is for convenience for other files WITHIN the fusion_replay crate.
pub mod prelude;

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod ingest;
pub mod output;
pub mod replay;
