use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use conveyor::hooks::{self, InstalledHook};
use conveyor::log_status;
use conveyor::{git, scaffold};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file and foreign hook scripts
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
pub struct InitOutput {
    pub config: PathBuf,
    pub config_written: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<InstalledHook>,
}

/// Write the generated starter config and wire up git hooks.
///
/// Outside a git repository only the config is written; hook installation
/// is skipped with a notice instead of failing the whole init.
pub fn run(args: InitArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<InitOutput> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join("conveyor.yaml");

    let config_written = if config_path.exists() && !args.force {
        log_status!(
            "init",
            "Keeping existing {} (use --force to overwrite)",
            config_path.display()
        );
        false
    } else {
        std::fs::write(&config_path, scaffold::starter_yaml()?)?;
        log_status!("init", "Wrote starter config to {}", config_path.display());
        true
    };

    let hooks = if git::git_dir(&cwd).is_ok() {
        hooks::install(&cwd, args.force)?
    } else {
        log_status!("init", "Not a git repository; skipping hook installation");
        Vec::new()
    };

    Ok((
        InitOutput {
            config: config_path,
            config_written,
            hooks,
        },
        0,
    ))
}
