//! Pipeline engine: registry plus the run/attach entrypoints.
//!
//! The registry is populated once from config and never mutated afterwards,
//! so `&Engine` can be shared across threads; everything a run mutates lives
//! in its own [`ExecContext`]. Attach chains are tracked in the context and
//! exported to spawned commands through an environment variable, which is
//! what lets cycle detection work even when one pipeline reaches another via
//! a `conveyor run --attach` shell command in a child process.

pub mod runner;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, PipelineRunResult};
use crate::trigger::{self, TriggerEvent};

/// Environment variable carrying the active attach chain, comma-separated.
/// Pipeline names may not contain `,` (enforced at config validation).
pub const ATTACH_CHAIN_ENV: &str = "CONVEYOR_ATTACH_CHAIN";

const CHAIN_SEPARATOR: char = ',';

/// Per-run execution state: the attach chain, the cancel flag and the event
/// that started the run. Cloned freely into parallel member threads.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    chain: Vec<String>,
    cancel: Arc<AtomicBool>,
    pub event: Option<TriggerEvent>,
    pub workdir: Option<PathBuf>,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a CLI invocation: picks up the attach chain a parent
    /// conveyor process exported before spawning us.
    pub fn from_env() -> Self {
        let chain = std::env::var(ATTACH_CHAIN_ENV)
            .ok()
            .map(|raw| {
                raw.split(CHAIN_SEPARATOR)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            chain,
            ..Self::default()
        }
    }

    pub fn with_chain(mut self, chain: &[String]) -> Self {
        self.chain = chain.to_vec();
        self
    }

    pub fn with_event(mut self, event: TriggerEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_workdir(mut self, workdir: PathBuf) -> Self {
        self.workdir = Some(workdir);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for raising the cancel signal from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    fn descend(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.chain.push(name.to_string());
        next
    }

    /// Environment exported to every spawned command.
    pub(crate) fn command_envs(&self) -> Vec<(String, String)> {
        vec![(
            ATTACH_CHAIN_ENV.to_string(),
            self.chain
                .join(&CHAIN_SEPARATOR.to_string()),
        )]
    }
}

/// The registry of named pipelines.
#[derive(Debug, Default)]
pub struct Engine {
    registry: HashMap<String, Pipeline>,
    order: Vec<String>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every pipeline of a loaded config, in declaration order.
    pub fn from_config(config: ConfigFile) -> Result<Self> {
        let mut engine = Self::new();
        for pipeline in config.pipelines {
            engine.register(pipeline)?;
        }
        Ok(engine)
    }

    /// Add a pipeline. The first registration under a name wins; a second
    /// one is rejected and leaves the registry untouched.
    pub fn register(&mut self, pipeline: Pipeline) -> Result<()> {
        if self.registry.contains_key(&pipeline.name) {
            return Err(Error::DuplicateName(pipeline.name));
        }
        self.order.push(pipeline.name.clone());
        self.registry.insert(pipeline.name.clone(), pipeline);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Pipeline> {
        self.registry.get(name)
    }

    /// Pipelines in declaration order.
    pub fn pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.order.iter().filter_map(|name| self.registry.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Run a pipeline by name in a fresh context.
    pub fn run(&self, name: &str) -> Result<PipelineRunResult> {
        self.run_with(name, ExecContext::new())
    }

    /// Run a pipeline on behalf of another one. Identical to [`Engine::run`]
    /// except the caller's attach chain is carried so revisits are rejected.
    pub fn attach(&self, name: &str, chain: &[String]) -> Result<PipelineRunResult> {
        self.run_with(name, ExecContext::new().with_chain(chain))
    }

    /// Run a pipeline with an explicit context.
    ///
    /// Fails with `PipelineNotFound` before any command executes; fails with
    /// `CycleDetected` when the name is already on the attach chain.
    pub fn run_with(&self, name: &str, ctx: ExecContext) -> Result<PipelineRunResult> {
        let pipeline = self
            .registry
            .get(name)
            .ok_or_else(|| Error::PipelineNotFound(name.to_string()))?;

        if ctx.chain.iter().any(|entry| entry == name) {
            let mut chain = ctx.chain.clone();
            chain.push(name.to_string());
            return Err(Error::CycleDetected(chain.join(" -> ")));
        }

        let ctx = ctx.descend(name);
        log_status!("engine", "Running pipeline '{}'", name);
        let result = runner::run_pipeline(pipeline, &ctx);
        log_status!(
            "engine",
            "Pipeline '{}' finished: {:?} in {}ms",
            name,
            result.status,
            result.duration_ms
        );
        Ok(result)
    }

    /// Every registered pipeline whose triggers select the event.
    pub fn matched(&self, event: &TriggerEvent) -> Vec<&Pipeline> {
        trigger::match_event(self.pipelines(), event)
    }
}
