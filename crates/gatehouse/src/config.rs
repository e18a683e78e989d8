//! CLI configuration: thin wrapper around `gatehouse_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--config, --store, --actor, --output, --color).

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

use gatehouse_core::{Actor, FileRepository, Gatehouse, TracingHooks};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use gatehouse_config::{Config, config_path, load_config_from, save_config_to};

/// The operator the CLI acts as when nothing else names one.
const DEFAULT_ACTOR: &str = "admin";

/// Config file named by `--config`, else the platform default.
pub fn resolved_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file layered with `GATEHOUSE_` overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = resolved_config_path(global);
    debug!(path = %path.display(), "loading config");
    Ok(load_config_from(&path)?)
}

/// Store file from `--store`, else the config.
pub fn store_path(global: &GlobalOpts, config: &Config) -> PathBuf {
    global.store.clone().unwrap_or_else(|| config.store_path())
}

/// Open the store with logging side effects.
pub fn open_gatehouse(global: &GlobalOpts, config: &Config) -> Result<Gatehouse, CliError> {
    let path = store_path(global, config);
    debug!(store = %path.display(), "opening configuration store");
    Ok(Gatehouse::new(
        Arc::new(FileRepository::new(path)),
        Arc::new(TracingHooks),
        config.to_settings(),
    )?)
}

/// Resolve the acting operator: flag > env > config > `admin`.
pub fn resolve_actor(
    global: &GlobalOpts,
    config: &Config,
    gate: &Gatehouse,
) -> Result<Actor, CliError> {
    let username = global
        .actor
        .clone()
        .or_else(|| config.cli.actor.clone())
        .unwrap_or_else(|| DEFAULT_ACTOR.into());
    gate.actor(&username)?
        .ok_or(CliError::UnknownActor { username })
}

/// Output format: flag > env > `defaults.output`.
pub fn output_format(global: &GlobalOpts, config: &Config) -> Result<OutputFormat, CliError> {
    match global.output {
        Some(format) => Ok(format),
        None => OutputFormat::from_str(&config.defaults.output, true).map_err(|reason| {
            CliError::Validation {
                field: "defaults.output".into(),
                reason,
            }
        }),
    }
}

pub fn color_mode(global: &GlobalOpts, config: &Config) -> Result<ColorMode, CliError> {
    match global.color {
        Some(mode) => Ok(mode),
        None => ColorMode::from_str(&config.defaults.color, true).map_err(|reason| {
            CliError::Validation {
                field: "defaults.color".into(),
                reason,
            }
        }),
    }
}
