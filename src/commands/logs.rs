use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use conveyor::{logs, RunStatus};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct LogsArgs {
    /// Only show runs of this pipeline
    #[arg(long)]
    pub name: Option<String>,

    /// Maximum number of runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Serialize)]
pub struct LogsOutput {
    pub runs: Vec<RunSummary>,
}

#[derive(Serialize)]
pub struct RunSummary {
    pub uuid: Uuid,
    pub name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub exit_code: i32,
}

pub fn run(args: LogsArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<LogsOutput> {
    let cwd = std::env::current_dir()?;
    let results = match args.name.as_deref() {
        Some(name) => logs::read_by_name(name, &cwd)?,
        None => logs::read_all(&cwd)?,
    };

    let runs = results
        .iter()
        .take(args.limit)
        .map(|r| RunSummary {
            uuid: r.uuid,
            name: r.name.clone(),
            status: r.status,
            started_at: r.started_at,
            duration_ms: r.duration_ms,
            exit_code: r.exit_code(),
        })
        .collect();

    Ok((LogsOutput { runs }, 0))
}
