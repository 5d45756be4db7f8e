// fusion_replay/src/main.rs

use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use fusion_replay::cli::Cli;
use fusion_replay::config::{load_config, render_config};
use fusion_replay::error::ReplayError;
use fusion_replay::replay::run_replay;

fn run(cli: &Cli) -> Result<(), ReplayError> {
    let config = load_config(cli)?;
    if cli.print_config {
        print!("{}", render_config(&config)?);
        return Ok(());
    }

    // clap guarantees both paths unless --print-config was given.
    let (Some(input), Some(output)) = (cli.input.as_ref(), cli.output.as_ref()) else {
        return Ok(());
    };

    let reader = File::open(input).map_err(|source| ReplayError::OpenInput {
        path: input.clone(),
        source,
    })?;
    let writer = File::create(output).map_err(|source| ReplayError::OpenOutput {
        path: output.clone(),
        source,
    })?;

    let mut writer = BufWriter::new(writer);
    let summary = run_replay(config, BufReader::new(reader), &mut writer)?;
    summary.log();
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
