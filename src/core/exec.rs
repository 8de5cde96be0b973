//! Shell command execution primitives.
//!
//! Commands are opaque strings handed to the platform shell; conveyor never
//! interprets their content. A non-zero exit is data, not an error — only a
//! failure to start the process surfaces as [`Error::Spawn`].

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Captured outcome of one shell command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
    pub duration_ms: u64,
}

fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run a command through the shell and wait for it, capturing output.
pub fn run_shell(
    command: &str,
    current_dir: Option<&Path>,
    envs: &[(String, String)],
) -> Result<CommandOutput> {
    let mut cmd = shell_command(command);

    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }
    cmd.envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    cmd.stdin(Stdio::null());

    let started = Instant::now();
    let out = cmd.output().map_err(|e| Error::Spawn {
        command: command.to_string(),
        source: e,
    })?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&out.stdout).to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        success: out.status.success(),
        exit_code: out.status.code().unwrap_or(-1),
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Start a command without waiting for it.
///
/// Stdio is nulled so the child outlives the caller cleanly. A watcher
/// thread waits on the child and routes its eventual failure to the stderr
/// log sink; nothing is ever reported back to the caller.
pub fn spawn_detached(
    command: &str,
    current_dir: Option<&Path>,
    envs: &[(String, String)],
) -> Result<()> {
    let mut cmd = shell_command(command);

    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }
    cmd.envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| Error::Spawn {
        command: command.to_string(),
        source: e,
    })?;

    let command = command.to_string();
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => {
            log_status!(
                "exec",
                "Detached command failed (exit {}): {}",
                status.code().unwrap_or(-1),
                command
            );
        }
        Ok(_) => {}
        Err(e) => {
            log_status!("exec", "Detached command unwaitable: {}: {}", command, e);
        }
    });

    Ok(())
}
