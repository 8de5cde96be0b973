//! Per-run JSON log files.
//!
//! Every attached run is persisted as `.conveyor/logs/<uuid>.json` under the
//! repository root (or the working directory outside a repo). The files are
//! plain serialized [`PipelineRunResult`]s, so `conveyor logs` and outside
//! tooling read them with no extra schema.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::git;
use crate::pipeline::PipelineRunResult;

const LOG_SUBDIR: &str = ".conveyor/logs";

/// Resolve the log directory for `dir`.
pub fn log_dir(dir: &Path) -> PathBuf {
    git::repo_root(dir)
        .unwrap_or_else(|| dir.to_path_buf())
        .join(LOG_SUBDIR)
}

/// Persist one run result; returns the file written.
pub fn save(result: &PipelineRunResult, dir: &Path) -> Result<PathBuf> {
    let logs = log_dir(dir);
    std::fs::create_dir_all(&logs)?;
    let path = logs.join(format!("{}.json", result.uuid));
    std::fs::write(&path, serde_json::to_string_pretty(result)?)?;
    Ok(path)
}

/// Read all persisted runs, newest first. Unreadable files are skipped with
/// a log line rather than failing the whole listing.
pub fn read_all(dir: &Path) -> Result<Vec<PipelineRunResult>> {
    let logs = log_dir(dir);
    if !logs.is_dir() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for entry in std::fs::read_dir(&logs)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
        {
            Ok(result) => results.push(result),
            Err(e) => log_status!("logs", "Skipping unreadable log {}: {}", path.display(), e),
        }
    }

    results.sort_by(|a: &PipelineRunResult, b: &PipelineRunResult| {
        b.started_at.cmp(&a.started_at)
    });
    Ok(results)
}

/// Persisted runs of one pipeline, newest first.
pub fn read_by_name(name: &str, dir: &Path) -> Result<Vec<PipelineRunResult>> {
    Ok(read_all(dir)?
        .into_iter()
        .filter(|r| r.name == name)
        .collect())
}
