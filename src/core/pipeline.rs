//! Pipeline data model and run result tree.
//!
//! Pipelines are created once at load time (config file or generator) and
//! are immutable afterwards; the engine looks them up by name. Run results
//! mirror the pipeline shape node by node and serialize to JSON for the CLI
//! envelope and the per-run log files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exec::CommandOutput;
use crate::trigger::TriggerEvent;

fn is_false(b: &bool) -> bool {
    !*b
}

/// A named, ordered sequence of steps and parallel groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pipeline {
    pub name: String,
    pub steps: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Total number of commands across all steps.
    pub fn command_count(&self) -> usize {
        self.steps
            .iter()
            .map(|node| match node {
                Node::Step(step) => step.commands.len(),
                Node::Parallel(group) => {
                    group.parallel.iter().map(|s| s.commands.len()).sum()
                }
            })
            .sum()
    }
}

/// One entry in a pipeline: a step, or a group of steps run concurrently.
///
/// Untagged so config files write steps directly and parallel groups as
/// `{ parallel: [ ... ] }`, matching the declarative input contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Node {
    Parallel(Parallel),
    Step(Step),
}

/// A set of steps executed concurrently and joined before the pipeline
/// proceeds. Member order carries no execution ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parallel {
    pub parallel: Vec<Step>,
}

/// An ordered list of shell commands under one name.
///
/// Blocking steps fail fast on the first non-zero exit. Non-blocking steps
/// fire every command detached; failures are logged, never propagated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub name: String,
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub non_blocking: bool,
}

impl Step {
    pub fn new(name: impl Into<String>, commands: Vec<String>) -> Self {
        Self {
            name: name.into(),
            commands,
            non_blocking: false,
        }
    }
}

/// Branch/action sets a pipeline auto-runs for.
///
/// An empty set means "any". Branch entries may be glob patterns; they are
/// never split or rewritten by the loader (a literal `"master, dev"` only
/// matches a branch of that exact name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

// ============================================================================
// Run results
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
    Skipped,
    Detached,
    Aborted,
}

impl RunStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Failed)
    }
}

/// Outcome of one command within a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResult {
    pub command: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn skipped(command: &str) -> Self {
        Self {
            command: command.to_string(),
            status: RunStatus::Skipped,
            output: None,
            error: None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.as_ref().map(|o| o.exit_code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub name: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "is_false")]
    pub non_blocking: bool,
    pub commands: Vec<CommandResult>,
    pub duration_ms: u64,
}

impl StepResult {
    /// First command that ran and failed, if any.
    pub fn first_failure(&self) -> Option<&CommandResult> {
        self.commands.iter().find(|c| c.status.is_failure())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParallelResult {
    pub status: RunStatus,
    pub steps: Vec<StepResult>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NodeResult {
    Step(StepResult),
    Parallel(ParallelResult),
}

impl NodeResult {
    pub fn status(&self) -> RunStatus {
        match self {
            NodeResult::Step(s) => s.status,
            NodeResult::Parallel(p) => p.status,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeResult::Step(s) => &s.name,
            NodeResult::Parallel(_) => "parallel",
        }
    }

    fn step_results(&self) -> Vec<&StepResult> {
        match self {
            NodeResult::Step(s) => vec![s],
            NodeResult::Parallel(p) => p.steps.iter().collect(),
        }
    }
}

/// Aggregated outcome of one pipeline run.
///
/// Owned by the invoking caller; the engine keeps nothing between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineRunResult {
    pub uuid: Uuid,
    pub name: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<TriggerEvent>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub nodes: Vec<NodeResult>,
}

impl PipelineRunResult {
    pub fn success(&self) -> bool {
        !matches!(self.status, RunStatus::Failed | RunStatus::Aborted)
    }

    /// Step holding the first blocking failure, with the failing command.
    pub fn first_failure(&self) -> Option<(&StepResult, &CommandResult)> {
        self.nodes
            .iter()
            .flat_map(|n| n.step_results())
            .filter(|s| !s.non_blocking)
            .find_map(|s| s.first_failure().map(|c| (s, c)))
    }

    /// Process exit code for this run: 0 on success, otherwise the first
    /// blocking failure's exit status when one is known.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            return 0;
        }
        self.first_failure()
            .and_then(|(_, c)| c.exit_code())
            .filter(|code| *code > 0)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_command(code: i32) -> CommandResult {
        CommandResult {
            command: "make package".to_string(),
            status: RunStatus::Failed,
            output: Some(CommandOutput {
                stdout: String::new(),
                stderr: "boom".to_string(),
                success: false,
                exit_code: code,
                duration_ms: 5,
            }),
            error: None,
        }
    }

    fn run_result(nodes: Vec<NodeResult>, status: RunStatus) -> PipelineRunResult {
        PipelineRunResult {
            uuid: Uuid::new_v4(),
            name: "package:debian".to_string(),
            status,
            event: None,
            started_at: Utc::now(),
            duration_ms: 10,
            nodes,
        }
    }

    #[test]
    fn node_parses_step_or_parallel() {
        let yaml = r#"
- name: build
  commands: ["make"]
- parallel:
    - name: a
      commands: ["echo a"]
    - name: b
      commands: ["echo b"]
      non_blocking: true
"#;
        let nodes: Vec<Node> = serde_yml::from_str(yaml).unwrap();
        assert!(matches!(nodes[0], Node::Step(_)));
        match &nodes[1] {
            Node::Parallel(group) => {
                assert_eq!(group.parallel.len(), 2);
                assert!(group.parallel[1].non_blocking);
            }
            other => panic!("expected parallel group, got {:?}", other),
        }
    }

    #[test]
    fn exit_code_propagates_first_blocking_failure() {
        let step = StepResult {
            name: "build".to_string(),
            status: RunStatus::Failed,
            non_blocking: false,
            commands: vec![failed_command(7)],
            duration_ms: 5,
        };
        let result = run_result(vec![NodeResult::Step(step)], RunStatus::Failed);
        assert_eq!(result.exit_code(), 7);
        assert!(!result.success());
    }

    #[test]
    fn exit_code_zero_on_success() {
        let result = run_result(Vec::new(), RunStatus::Succeeded);
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn first_failure_ignores_non_blocking_steps() {
        let detached = StepResult {
            name: "cleanup".to_string(),
            status: RunStatus::Detached,
            non_blocking: true,
            commands: vec![failed_command(1)],
            duration_ms: 0,
        };
        let failed = StepResult {
            name: "build".to_string(),
            status: RunStatus::Failed,
            non_blocking: false,
            commands: vec![failed_command(2)],
            duration_ms: 1,
        };
        let result = run_result(
            vec![NodeResult::Step(detached), NodeResult::Step(failed)],
            RunStatus::Failed,
        );
        let (step, command) = result.first_failure().unwrap();
        assert_eq!(step.name, "build");
        assert_eq!(command.exit_code(), Some(2));
    }

    #[test]
    fn command_count_spans_parallel_members() {
        let mut pipeline = Pipeline::new("make:packages");
        pipeline.steps.push(Node::Parallel(Parallel {
            parallel: vec![
                Step::new("a", vec!["x".into(), "y".into()]),
                Step::new("b", vec!["z".into()]),
            ],
        }));
        assert_eq!(pipeline.command_count(), 3);
    }
}
