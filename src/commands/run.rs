use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use conveyor::engine::ExecContext;
use conveyor::log_status;
use conveyor::trigger::{TriggerEvent, MANUAL_ACTION};
use conveyor::utils::shell;
use conveyor::{config, exec, logs, Engine, Error, PipelineRunResult};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline name
    pub name: String,

    /// Run in the foreground and exit with the pipeline's status
    /// (the default detaches and exits once the child is spawned)
    #[arg(long)]
    pub attach: bool,

    /// Explicit config file path
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Serialize)]
pub struct RunOutput {
    pub name: String,
    pub detached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineRunResult>,
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunOutput> {
    let (_config_path, config) = config::load_or_discover(args.config.as_deref())?;
    let engine = Engine::from_config(config)?;

    if !args.attach {
        return detach(&engine, &args);
    }

    let event = TriggerEvent::from_env(MANUAL_ACTION);
    let ctx = ExecContext::from_env().with_event(event);
    let result = engine.run_with(&args.name, ctx)?;

    let cwd = std::env::current_dir()?;
    let log_file = logs::save(&result, &cwd)?;
    let exit_code = result.exit_code();

    Ok((
        RunOutput {
            name: args.name,
            detached: false,
            log_file: Some(log_file),
            result: Some(result),
        },
        exit_code,
    ))
}

/// Re-invoke ourselves detached with `--attach`; the child does the actual
/// work and writes the run log. Unknown names are still rejected up front so
/// a typo doesn't silently spawn nothing.
fn detach(engine: &Engine, args: &RunArgs) -> CmdResult<RunOutput> {
    engine
        .get(&args.name)
        .ok_or_else(|| Error::PipelineNotFound(args.name.clone()))?;

    let exe = std::env::current_exe()?;
    let mut command = format!(
        "{} run --attach {}",
        shell::quote_path(&exe.to_string_lossy()),
        shell::quote_arg(&args.name)
    );
    if let Some(config) = &args.config {
        command.push_str(&format!(" --config {}", shell::quote_arg(config)));
    }

    exec::spawn_detached(&command, None, &[])?;
    log_status!("run", "Detached pipeline '{}'", args.name);

    Ok((
        RunOutput {
            name: args.name.clone(),
            detached: true,
            log_file: None,
            result: None,
        },
        0,
    ))
}
