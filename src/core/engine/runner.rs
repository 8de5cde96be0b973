//! Node execution: steps, parallel groups and whole pipelines.
//!
//! A pipeline run is one logical task walking its nodes in order. The only
//! concurrency is one thread per parallel member (joined before the next
//! node starts) plus the detached watcher threads owned by `exec`.

use std::thread;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use super::ExecContext;
use crate::exec;
use crate::pipeline::{
    CommandResult, Node, NodeResult, Parallel, ParallelResult, Pipeline, PipelineRunResult,
    RunStatus, Step, StepResult,
};

pub(crate) fn run_pipeline(pipeline: &Pipeline, ctx: &ExecContext) -> PipelineRunResult {
    let started_at = Utc::now();
    let timer = Instant::now();

    let mut nodes = Vec::with_capacity(pipeline.steps.len());
    let mut failed = false;
    let mut aborted = false;

    for node in &pipeline.steps {
        if failed || aborted {
            nodes.push(skip_node(node));
            continue;
        }
        if ctx.cancelled() {
            aborted = true;
            nodes.push(skip_node(node));
            continue;
        }

        let result = run_node(node, ctx);
        match result.status() {
            RunStatus::Failed => failed = true,
            RunStatus::Aborted => aborted = true,
            _ => {}
        }
        nodes.push(result);
    }

    let status = if aborted {
        RunStatus::Aborted
    } else if failed {
        RunStatus::Failed
    } else {
        RunStatus::Succeeded
    };

    PipelineRunResult {
        uuid: Uuid::new_v4(),
        name: pipeline.name.clone(),
        status,
        event: ctx.event.clone(),
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
        nodes,
    }
}

fn run_node(node: &Node, ctx: &ExecContext) -> NodeResult {
    match node {
        Node::Step(step) => NodeResult::Step(run_step(step, ctx)),
        Node::Parallel(group) => NodeResult::Parallel(run_parallel(group, ctx)),
    }
}

/// Execute one step's commands strictly in order.
///
/// Blocking: the first non-zero exit (or spawn failure) fails the step and
/// skips the remaining commands. Non-blocking: every command is fired
/// detached; spawn failures are logged and recorded, never propagated.
pub(crate) fn run_step(step: &Step, ctx: &ExecContext) -> StepResult {
    let timer = Instant::now();
    let envs = ctx.command_envs();
    let workdir = ctx.workdir.as_deref();
    let mut commands = Vec::with_capacity(step.commands.len());

    if step.non_blocking {
        for command in &step.commands {
            match exec::spawn_detached(command, workdir, &envs) {
                Ok(()) => commands.push(CommandResult {
                    command: command.clone(),
                    status: RunStatus::Detached,
                    output: None,
                    error: None,
                }),
                Err(e) => {
                    log_status!("run", "Step '{}': {}", step.name, e);
                    commands.push(CommandResult {
                        command: command.clone(),
                        status: RunStatus::Failed,
                        output: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        return StepResult {
            name: step.name.clone(),
            status: RunStatus::Detached,
            non_blocking: true,
            commands,
            duration_ms: timer.elapsed().as_millis() as u64,
        };
    }

    let mut status = RunStatus::Succeeded;
    for (idx, command) in step.commands.iter().enumerate() {
        if ctx.cancelled() {
            status = RunStatus::Aborted;
            commands.extend(step.commands[idx..].iter().map(|c| CommandResult::skipped(c)));
            break;
        }

        match exec::run_shell(command, workdir, &envs) {
            Ok(output) if output.success => commands.push(CommandResult {
                command: command.clone(),
                status: RunStatus::Succeeded,
                output: Some(output),
                error: None,
            }),
            Ok(output) => {
                log_status!(
                    "run",
                    "Step '{}' failed (exit {}): {}",
                    step.name,
                    output.exit_code,
                    command
                );
                commands.push(CommandResult {
                    command: command.clone(),
                    status: RunStatus::Failed,
                    output: Some(output),
                    error: None,
                });
                status = RunStatus::Failed;
                commands.extend(
                    step.commands[idx + 1..]
                        .iter()
                        .map(|c| CommandResult::skipped(c)),
                );
                break;
            }
            Err(e) => {
                log_status!("run", "Step '{}': {}", step.name, e);
                commands.push(CommandResult {
                    command: command.clone(),
                    status: RunStatus::Failed,
                    output: None,
                    error: Some(e.to_string()),
                });
                status = RunStatus::Failed;
                commands.extend(
                    step.commands[idx + 1..]
                        .iter()
                        .map(|c| CommandResult::skipped(c)),
                );
                break;
            }
        }
    }

    StepResult {
        name: step.name.clone(),
        status,
        non_blocking: false,
        commands,
        duration_ms: timer.elapsed().as_millis() as u64,
    }
}

/// Execute every member step concurrently and join them all.
///
/// Siblings are never aborted early: a failing member does not stop the
/// others, it only makes the aggregate fail once everyone has finished.
pub(crate) fn run_parallel(group: &Parallel, ctx: &ExecContext) -> ParallelResult {
    let timer = Instant::now();

    let steps: Vec<StepResult> = if group.parallel.len() <= 1 {
        group.parallel.iter().map(|s| run_step(s, ctx)).collect()
    } else {
        let handles: Vec<_> = group
            .parallel
            .iter()
            .map(|step| {
                let step = step.clone();
                let ctx = ctx.clone();
                thread::spawn(move || run_step(&step, &ctx))
            })
            .collect();

        handles
            .into_iter()
            .zip(&group.parallel)
            .map(|(handle, step)| {
                handle.join().unwrap_or_else(|_| {
                    log_status!("run", "Parallel member '{}' panicked", step.name);
                    StepResult {
                        name: step.name.clone(),
                        status: RunStatus::Failed,
                        non_blocking: step.non_blocking,
                        commands: Vec::new(),
                        duration_ms: 0,
                    }
                })
            })
            .collect()
    };

    let status = if steps.iter().any(|s| s.status == RunStatus::Aborted) {
        RunStatus::Aborted
    } else if steps
        .iter()
        .any(|s| !s.non_blocking && s.status.is_failure())
    {
        RunStatus::Failed
    } else {
        RunStatus::Succeeded
    };

    ParallelResult {
        status,
        steps,
        duration_ms: timer.elapsed().as_millis() as u64,
    }
}

fn skip_node(node: &Node) -> NodeResult {
    match node {
        Node::Step(step) => NodeResult::Step(skip_step(step)),
        Node::Parallel(group) => NodeResult::Parallel(ParallelResult {
            status: RunStatus::Skipped,
            steps: group.parallel.iter().map(skip_step).collect(),
            duration_ms: 0,
        }),
    }
}

fn skip_step(step: &Step) -> StepResult {
    StepResult {
        name: step.name.clone(),
        status: RunStatus::Skipped,
        non_blocking: step.non_blocking,
        commands: step
            .commands
            .iter()
            .map(|c| CommandResult::skipped(c))
            .collect(),
        duration_ms: 0,
    }
}
