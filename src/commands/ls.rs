use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use conveyor::{config, Engine, Trigger};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct LsArgs {
    /// Explicit config file path
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Serialize)]
pub struct LsOutput {
    pub config: PathBuf,
    pub pipelines: Vec<PipelineSummary>,
}

#[derive(Serialize)]
pub struct PipelineSummary {
    pub name: String,
    pub nodes: usize,
    pub commands: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

pub fn run(args: LsArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<LsOutput> {
    let (config_path, config) = config::load_or_discover(args.config.as_deref())?;
    let engine = Engine::from_config(config)?;

    let pipelines = engine
        .pipelines()
        .map(|p| PipelineSummary {
            name: p.name.clone(),
            nodes: p.steps.len(),
            commands: p.command_count(),
            triggers: p.triggers.clone(),
        })
        .collect();

    Ok((
        LsOutput {
            config: config_path,
            pipelines,
        },
        0,
    ))
}
