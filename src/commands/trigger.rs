use clap::Args;
use serde::Serialize;

use conveyor::engine::ExecContext;
use conveyor::log_status;
use conveyor::trigger::{TriggerEvent, MANUAL_ACTION};
use conveyor::{config, logs, Engine, RunStatus};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct TriggerArgs {
    /// Git hook that fired (e.g. pre-push); defaults to a manual event
    #[arg(long)]
    pub action: Option<String>,

    /// Explicit config file path
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Serialize)]
pub struct TriggerOutput {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub selected: Vec<String>,
    pub runs: Vec<TriggerRun>,
}

#[derive(Serialize)]
pub struct TriggerRun {
    pub name: String,
    pub status: RunStatus,
    pub exit_code: i32,
}

pub fn run(args: TriggerArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<TriggerOutput> {
    let (_config_path, config) = config::load_or_discover(args.config.as_deref())?;
    let engine = Engine::from_config(config)?;

    let action = args.action.unwrap_or_else(|| MANUAL_ACTION.to_string());
    let event = TriggerEvent::from_env(action);

    let selected: Vec<String> = engine
        .matched(&event)
        .iter()
        .map(|p| p.name.clone())
        .collect();
    log_status!(
        "trigger",
        "Event '{}' on branch {:?} selected {} pipeline(s)",
        event.action,
        event.branch,
        selected.len()
    );

    let cwd = std::env::current_dir()?;
    let mut runs = Vec::with_capacity(selected.len());
    let mut exit_code = 0;

    for name in &selected {
        let ctx = ExecContext::from_env().with_event(event.clone());
        let result = engine.run_with(name, ctx)?;
        logs::save(&result, &cwd)?;

        if !result.success() && exit_code == 0 {
            exit_code = result.exit_code();
        }
        runs.push(TriggerRun {
            name: name.clone(),
            status: result.status,
            exit_code: result.exit_code(),
        });
    }

    Ok((
        TriggerOutput {
            action: event.action,
            branch: event.branch,
            selected,
            runs,
        },
        exit_code,
    ))
}
