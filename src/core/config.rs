//! Declarative config loading and validation.
//!
//! The config file holds the full pipeline registry in data form. YAML, JSON
//! and TOML are accepted; discovery looks in the working directory first,
//! then at the git repository root. Validation runs before the engine ever
//! sees a pipeline: hard errors abort the load, soft findings come back as
//! warnings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::git;
use crate::pipeline::{Node, Pipeline};

/// Candidate config file names, tried in order.
pub const CONFIG_BASENAMES: &[&str] = &[
    "conveyor.yaml",
    "conveyor.yml",
    "conveyor.json",
    "conveyor.toml",
];

/// Pipeline names must be shell-friendly and must not contain `,`, which
/// separates entries in the attach-chain environment variable.
fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9:_ .\-]*$").unwrap())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

/// Find a config file: `start` first, then the repository root.
pub fn discover(start: &Path) -> Result<PathBuf> {
    let mut roots = vec![start.to_path_buf()];
    if let Some(repo) = git::repo_root(start) {
        if repo != start {
            roots.push(repo);
        }
    }

    for root in roots {
        for basename in CONFIG_BASENAMES {
            let candidate = root.join(basename);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(Error::Config(format!(
        "no config file found (looked for {} in {} and the repository root)",
        CONFIG_BASENAMES.join(", "),
        start.display()
    )))
}

/// Parse a config file according to its extension.
pub fn load(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ext {
        "yaml" | "yml" => Ok(serde_yml::from_str(&raw)?),
        "json" => Ok(serde_json::from_str(&raw)?),
        "toml" => Ok(toml::from_str(&raw)?),
        other => Err(Error::Config(format!(
            "unsupported config format '.{}': {}",
            other,
            path.display()
        ))),
    }
}

/// Resolve an explicit `--config` path (tilde-expanded) or discover one,
/// then load and validate it. Warnings are logged, not returned.
pub fn load_or_discover(explicit: Option<&str>) -> Result<(PathBuf, ConfigFile)> {
    let path = match explicit {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).to_string()),
        None => {
            let cwd = std::env::current_dir()?;
            discover(&cwd)?
        }
    };

    let config = load(&path)?;
    for warning in validate(&config)? {
        log_status!("config", "{}", warning);
    }
    Ok((path, config))
}

/// Validate a loaded config.
///
/// Errors: invalid pipeline names, duplicate pipeline names. Everything
/// else that merely smells wrong (empty pipelines, comma-joined branch
/// entries) is returned as a warning.
pub fn validate(config: &ConfigFile) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    if config.pipelines.is_empty() {
        warnings.push("config defines no pipelines".to_string());
    }

    for pipeline in &config.pipelines {
        if !name_pattern().is_match(&pipeline.name) {
            return Err(Error::Config(format!(
                "invalid pipeline name '{}' (allowed: letters, digits, ':', '_', '.', '-', space)",
                pipeline.name
            )));
        }
        if !seen.insert(&pipeline.name) {
            return Err(Error::DuplicateName(pipeline.name.clone()));
        }

        if pipeline.steps.is_empty() {
            warnings.push(format!("pipeline '{}' has no steps", pipeline.name));
        }

        for node in &pipeline.steps {
            let steps: Vec<&crate::pipeline::Step> = match node {
                Node::Step(step) => vec![step],
                Node::Parallel(group) => group.parallel.iter().collect(),
            };
            for step in steps {
                if step.commands.is_empty() {
                    warnings.push(format!(
                        "step '{}' in pipeline '{}' has no commands",
                        step.name, pipeline.name
                    ));
                }
            }
        }

        for trigger in &pipeline.triggers {
            for branch in &trigger.branches {
                if branch.contains(',') {
                    warnings.push(format!(
                        "pipeline '{}': branch entry \"{}\" contains a comma and is matched \
                         as one literal name; split it into separate entries if a list was meant",
                        pipeline.name, branch
                    ));
                }
            }
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Step, Trigger};
    use std::io::Write;

    const SAMPLE_YAML: &str = r#"
pipelines:
  - name: test
    steps:
      - name: test
        commands: ["cargo test --lib"]
    triggers:
      - branches: ["master"]
        actions: ["pre-push"]
  - name: "test dev"
    steps:
      - name: test
        commands: ["cargo test"]
    triggers:
      - branches: ["master, dev"]
        actions: ["pre-push"]
"#;

    fn write_config(dir: &Path, basename: &str, content: &str) -> PathBuf {
        let path = dir.join(basename);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "conveyor.yaml", SAMPLE_YAML);
        let config = load(&path).unwrap();
        assert_eq!(config.pipelines.len(), 2);
        assert_eq!(config.pipelines[0].name, "test");
        assert_eq!(
            config.pipelines[1].triggers[0].branches,
            vec!["master, dev".to_string()]
        );
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "conveyor.json",
            r#"{"pipelines":[{"name":"upload","steps":[{"name":"push","commands":["rsync -av packages/ host:/srv"]}]}]}"#,
        );
        let config = load(&path).unwrap();
        assert_eq!(config.pipelines[0].name, "upload");
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "conveyor.toml",
            r#"
[[pipelines]]
name = "test"

[[pipelines.steps]]
name = "test"
commands = ["cargo test"]
"#,
        );
        let config = load(&path).unwrap();
        assert_eq!(config.pipelines[0].name, "test");
        assert_eq!(config.pipelines[0].steps.len(), 1);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "conveyor.ini", "pipelines: []");
        let err = load(&path).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn discover_prefers_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "conveyor.yml", "pipelines: []");
        let found = discover(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "conveyor.yml");
    }

    #[test]
    fn discover_fails_cleanly_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(dir.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let config = ConfigFile {
            pipelines: vec![Pipeline::new("test"), Pipeline::new("test")],
        };
        let err = validate(&config).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_NAME");
    }

    #[test]
    fn validate_rejects_comma_in_name() {
        let config = ConfigFile {
            pipelines: vec![Pipeline::new("a,b")],
        };
        let err = validate(&config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn validate_warns_on_comma_joined_branches() {
        let mut pipeline = Pipeline::new("test dev");
        pipeline.steps.push(Node::Step(Step::new(
            "test",
            vec!["cargo test".to_string()],
        )));
        pipeline.triggers.push(Trigger {
            branches: vec!["master, dev".to_string()],
            actions: vec!["pre-push".to_string()],
        });
        let config = ConfigFile {
            pipelines: vec![pipeline],
        };

        let warnings = validate(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("comma"));
    }

    #[test]
    fn validate_warns_on_empty_steps() {
        let config = ConfigFile {
            pipelines: vec![Pipeline::new("empty")],
        };
        let warnings = validate(&config).unwrap();
        assert!(warnings.iter().any(|w| w.contains("no steps")));
    }
}
