use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use conveyor::{config, Engine};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct CheckArgs {
    /// Explicit config file path
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Serialize)]
pub struct CheckOutput {
    pub config: PathBuf,
    pub pipelines: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Load and validate the config without executing anything. Hard errors
/// (bad names, duplicates, parse failures) surface as the command error;
/// soft findings come back in `warnings`.
pub fn run(args: CheckArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<CheckOutput> {
    let config_path = match args.config.as_deref() {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).to_string()),
        None => config::discover(&std::env::current_dir()?)?,
    };

    let loaded = config::load(&config_path)?;
    let warnings = config::validate(&loaded)?;
    let engine = Engine::from_config(loaded)?;

    Ok((
        CheckOutput {
            config: config_path,
            pipelines: engine.len(),
            warnings,
        },
        0,
    ))
}
