use clap::Parser;

mod commands;
mod output;

use commands::{check, init, logs, ls, run, trigger, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "conveyor")]
#[command(version = VERSION)]
#[command(about = "Declarative build, package and upload pipeline automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a pipeline by name
    Run(run::RunArgs),
    /// Build a trigger event and run every matching pipeline
    Trigger(trigger::TriggerArgs),
    /// List registered pipelines
    Ls(ls::LsArgs),
    /// Load and validate the config without running anything
    Check(check::CheckArgs),
    /// Show persisted run logs
    Logs(logs::LogsArgs),
    /// Write a starter config and install git hooks
    Init(init::InitArgs),
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = match cli.command {
        Commands::Run(args) => dispatch!(args, &global, run),
        Commands::Trigger(args) => dispatch!(args, &global, trigger),
        Commands::Ls(args) => dispatch!(args, &global, ls),
        Commands::Check(args) => dispatch!(args, &global, check),
        Commands::Logs(args) => dispatch!(args, &global, logs),
        Commands::Init(args) => dispatch!(args, &global, init),
    };

    output::print_json_result(json_result);
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
