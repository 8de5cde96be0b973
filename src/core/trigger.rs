//! Trigger event matching.
//!
//! An event is the current git branch plus the action that fired (a git hook
//! name, or `manual` for explicit invocations). A pipeline auto-runs when any
//! of its triggers matches: branch set AND action set must both hit.

use chrono::{DateTime, Utc};
use glob_match::glob_match;
use serde::{Deserialize, Serialize};

use crate::git;
use crate::pipeline::{Pipeline, Trigger};

/// The action recorded for explicit `run` invocations.
pub const MANUAL_ACTION: &str = "manual";

/// A runtime event handed to the matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerEvent {
    /// Current branch; `None` outside a git repository or on a detached HEAD.
    pub branch: Option<String>,
    pub action: String,
    pub date: DateTime<Utc>,
}

impl TriggerEvent {
    pub fn new(branch: Option<String>, action: impl Into<String>) -> Self {
        Self {
            branch,
            action: action.into(),
            date: Utc::now(),
        }
    }

    /// Build the event for the current working directory.
    pub fn from_env(action: impl Into<String>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
        Self::new(git::current_branch(&cwd), action)
    }
}

impl Trigger {
    /// True when this trigger selects the event.
    ///
    /// Branch entries match by exact string or glob pattern. An empty
    /// `branches` or `actions` list matches anything. A comma-joined entry
    /// like `"master, dev"` is one literal and matches only a branch of that
    /// exact name — the loader warns about such entries instead of splitting
    /// them.
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        self.matches_action(&event.action) && self.matches_branch(event.branch.as_deref())
    }

    fn matches_action(&self, action: &str) -> bool {
        self.actions.is_empty() || self.actions.iter().any(|a| a == action)
    }

    fn matches_branch(&self, branch: Option<&str>) -> bool {
        if self.branches.is_empty() {
            return true;
        }
        match branch {
            Some(branch) => self
                .branches
                .iter()
                .any(|pattern| pattern == branch || glob_match(pattern, branch)),
            None => false,
        }
    }
}

/// Select every pipeline whose triggers match the event, in declaration
/// order. Pipelines without triggers only run on explicit invocation.
pub fn match_event<'a>(
    pipelines: impl IntoIterator<Item = &'a Pipeline>,
    event: &TriggerEvent,
) -> Vec<&'a Pipeline> {
    pipelines
        .into_iter()
        .filter(|p| p.triggers.iter().any(|t| t.matches(event)))
        .collect()
}
