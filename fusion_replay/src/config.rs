// fusion_replay/src/config.rs

//! Layered loading of the [`FusionConfig`]: an optional TOML file, then `FUSION_`-prefixed
//! environment variables, then command-line flags. Anything no layer sets takes the
//! serde defaults of the config structs.
//!
//! The defaults are not merged in as a figment layer: a merged `[motion]` table would
//! mix the default model's keys into a file that selects the other model.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use fusion_core::config::{FusionConfig, MotionConfig};
use std::path::Path;
use tracing::info;

use crate::cli::{Cli, MotionArg};
use crate::error::ReplayError;

/// Environment variables with this prefix override file values. Nested keys use a
/// double underscore, e.g. `FUSION_RADAR__STD_PHI=0.05`.
pub const ENV_PREFIX: &str = "FUSION_";

/// The file and environment layers, without the CLI flags.
pub fn base_figment(config_path: Option<&Path>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        figment = figment.merge(Toml::file_exact(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Applies the command-line flags, which win over every other layer.
pub fn apply_cli_overrides(config: &mut FusionConfig, cli: &Cli) {
    if let Some(filter) = cli.filter {
        config.filter = filter.into();
    }
    if let Some(motion) = cli.motion {
        // Keep the tuned noise when the file already selected this model.
        if config.motion.name() != motion.name() {
            config.motion = match motion {
                MotionArg::Ctrv => MotionConfig::default(),
                MotionArg::Cv => MotionConfig::default_cv(),
            };
        }
    }
    if cli.no_laser {
        config.use_laser = false;
    }
    if cli.no_radar {
        config.use_radar = false;
    }
}

/// Extracts the fully layered configuration and validates it.
pub fn load_config(cli: &Cli) -> Result<FusionConfig, ReplayError> {
    let mut config: FusionConfig = base_figment(cli.config.as_deref()).extract()?;
    apply_cli_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

/// Renders the effective configuration the way it would be written in a config file.
pub fn render_config(config: &FusionConfig) -> Result<String, ReplayError> {
    Ok(toml::to_string_pretty(config)?)
}
