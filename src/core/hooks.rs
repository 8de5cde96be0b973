//! Git hook installation.
//!
//! Each installed hook is a small shell script that calls
//! `conveyor trigger --action <hook>`, turning git events into trigger
//! events. Scripts carry a marker line so reinstalls only ever overwrite
//! files conveyor wrote itself; foreign hooks are left alone unless forced.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::git;

/// Hooks conveyor wires up. Matches the git-hook actions triggers name.
pub const GIT_HOOKS: &[&str] = &[
    "pre-commit",
    "pre-push",
    "post-commit",
    "post-checkout",
    "post-merge",
];

const MARKER: &str = "# installed by conveyor";

#[derive(Debug, Clone, Serialize)]
pub struct InstalledHook {
    pub hook: String,
    pub path: PathBuf,
    pub written: bool,
}

fn hook_script(hook: &str) -> String {
    format!("#!/bin/sh\n{}\nconveyor trigger --action {} \"$@\"\n", MARKER, hook)
}

fn is_ours(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|content| content.contains(MARKER))
        .unwrap_or(false)
}

/// Install hook scripts for the repository containing `dir`.
pub fn install(dir: &Path, force: bool) -> Result<Vec<InstalledHook>> {
    let hooks_dir = git::git_dir(dir)?.join("hooks");
    install_into(&hooks_dir, force)
}

/// Install hook scripts into an explicit hooks directory.
pub fn install_into(hooks_dir: &Path, force: bool) -> Result<Vec<InstalledHook>> {
    std::fs::create_dir_all(hooks_dir)?;

    let mut installed = Vec::with_capacity(GIT_HOOKS.len());
    for hook in GIT_HOOKS {
        let path = hooks_dir.join(hook);

        if path.exists() && !force && !is_ours(&path) {
            log_status!("hooks", "Skipping existing hook '{}' (use --force to overwrite)", hook);
            installed.push(InstalledHook {
                hook: hook.to_string(),
                path,
                written: false,
            });
            continue;
        }

        std::fs::write(&path, hook_script(hook))?;
        set_executable(&path)?;
        installed.push(InstalledHook {
            hook: hook.to_string(),
            path,
            written: true,
        });
    }

    Ok(installed)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_every_hook_script() {
        let dir = tempfile::tempdir().unwrap();
        let installed = install_into(dir.path(), false).unwrap();

        assert_eq!(installed.len(), GIT_HOOKS.len());
        for entry in &installed {
            assert!(entry.written);
            let content = std::fs::read_to_string(&entry.path).unwrap();
            assert!(content.starts_with("#!/bin/sh"));
            assert!(content.contains(&format!("--action {}", entry.hook)));
        }
    }

    #[cfg(unix)]
    #[test]
    fn scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let installed = install_into(dir.path(), false).unwrap();
        let mode = std::fs::metadata(&installed[0].path)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn foreign_hook_is_preserved_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("pre-push");
        std::fs::write(&custom, "#!/bin/sh\necho custom\n").unwrap();

        let installed = install_into(dir.path(), false).unwrap();
        let pre_push = installed.iter().find(|h| h.hook == "pre-push").unwrap();
        assert!(!pre_push.written);
        assert!(std::fs::read_to_string(&custom).unwrap().contains("custom"));
    }

    #[test]
    fn force_overwrites_foreign_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("pre-push");
        std::fs::write(&custom, "#!/bin/sh\necho custom\n").unwrap();

        install_into(dir.path(), true).unwrap();
        assert!(std::fs::read_to_string(&custom).unwrap().contains(MARKER));
    }

    #[test]
    fn reinstall_updates_our_own_hooks() {
        let dir = tempfile::tempdir().unwrap();
        install_into(dir.path(), false).unwrap();
        let installed = install_into(dir.path(), false).unwrap();
        assert!(installed.iter().all(|h| h.written));
    }
}
