//! Starter config generation.
//!
//! The packaging pipelines are mechanical: one per distro plus an aggregate
//! that fans out to all of them. Both sides are derived from the same
//! `DistroSpec` slice, so the aggregate's attach targets and the generated
//! pipeline names cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::config::ConfigFile;
use crate::error::Result;
use crate::pipeline::{Node, Parallel, Pipeline, Step, Trigger};
use crate::utils::shell;

/// One target distribution: how to build its image and what it produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistroSpec {
    pub name: String,
    pub prefix: String,
    pub format: String,
}

impl DistroSpec {
    pub fn new(name: &str, prefix: &str, format: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            format: format.to_string(),
        }
    }

    /// Name of the pipeline generated for this distro.
    pub fn pipeline_name(&self) -> String {
        format!("package:{}", self.name)
    }
}

pub fn default_distros() -> Vec<DistroSpec> {
    vec![
        DistroSpec::new("debian", "deb", "deb"),
        DistroSpec::new("archlinux", "aur", "pkg.tar.zst"),
    ]
}

/// Build/run pipeline for one distro: drop the stale container
/// (non-blocking, it may not exist), rebuild the image, run it with the
/// package output directory mounted.
pub fn packaging_pipeline(distro: &DistroSpec) -> Pipeline {
    let mut pipeline = Pipeline::new(distro.pipeline_name());

    pipeline.steps.push(Node::Step(Step {
        name: format!("remove old {} container", distro.name),
        commands: vec![format!("docker container rm {}.latest", distro.name)],
        non_blocking: true,
    }));
    pipeline.steps.push(Node::Step(Step::new(
        format!("build {} container", distro.name),
        vec![format!(
            "docker build --pull --no-cache -f .conveyor/docker/Dockerfile.{} -t {}.latest .",
            distro.prefix, distro.name
        )],
    )));
    pipeline.steps.push(Node::Step(Step::new(
        format!("run {} container", distro.name),
        vec![format!(
            "docker run --mount type=bind,source=./packages,target=/root/dist --name={}.latest {}.latest",
            distro.name, distro.name
        )],
    )));

    pipeline
}

/// The fan-out pipeline: one parallel step per distro, each attaching to
/// the matching per-distro pipeline by name.
pub fn aggregate_pipeline(distros: &[DistroSpec]) -> Pipeline {
    let mut pipeline = Pipeline::new("make:packages");
    pipeline.steps.push(Node::Parallel(Parallel {
        parallel: distros
            .iter()
            .map(|distro| {
                let target = distro.pipeline_name();
                Step::new(
                    target.clone(),
                    vec![format!(
                        "conveyor run --attach {}",
                        shell::quote_arg(&target)
                    )],
                )
            })
            .collect(),
    }));
    pipeline
}

/// Ship every produced package format to the package host.
pub fn upload_pipeline(distros: &[DistroSpec]) -> Pipeline {
    let mut pipeline = Pipeline::new("upload:packages");
    pipeline.steps.push(Node::Step(Step::new(
        "upload packages",
        distros
            .iter()
            .map(|distro| {
                format!(
                    "rsync -av packages/*.{} deploy@packages.example.com:/srv/packages/",
                    distro.format
                )
            })
            .collect(),
    )));
    pipeline
}

/// Test pipelines: the strict one guards master pushes, the broad one also
/// covers dev.
pub fn test_pipelines() -> Vec<Pipeline> {
    let mut test = Pipeline::new("test");
    test.steps.push(Node::Step(Step::new(
        "test",
        vec!["cargo test --lib".to_string()],
    )));
    test.triggers.push(Trigger {
        branches: vec!["master".to_string()],
        actions: vec!["pre-push".to_string()],
    });

    let mut test_dev = Pipeline::new("test:dev");
    test_dev.steps.push(Node::Step(Step::new(
        "test",
        vec!["cargo test".to_string()],
    )));
    test_dev.triggers.push(Trigger {
        branches: vec!["master".to_string(), "dev".to_string()],
        actions: vec!["pre-push".to_string()],
    });

    vec![test, test_dev]
}

/// The full starter registry, generated from one shared distro list.
pub fn starter_config(distros: &[DistroSpec]) -> ConfigFile {
    let mut pipelines = vec![aggregate_pipeline(distros)];
    pipelines.extend(distros.iter().map(packaging_pipeline));
    pipelines.push(upload_pipeline(distros));
    pipelines.extend(test_pipelines());
    ConfigFile { pipelines }
}

/// Starter config rendered as YAML, ready to write to `conveyor.yaml`.
pub fn starter_yaml() -> Result<String> {
    let config = starter_config(&default_distros());
    Ok(serde_yml::to_string(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn aggregate_step_names_match_generated_pipeline_names() {
        let distros = default_distros();
        let aggregate = aggregate_pipeline(&distros);
        let generated: Vec<String> = distros
            .iter()
            .map(|d| packaging_pipeline(d).name)
            .collect();

        let parallel_names: Vec<String> = match &aggregate.steps[0] {
            Node::Parallel(group) => group.parallel.iter().map(|s| s.name.clone()).collect(),
            other => panic!("aggregate must start with a parallel group, got {:?}", other),
        };

        assert_eq!(parallel_names, generated);
    }

    #[test]
    fn aggregate_attaches_by_pipeline_name() {
        let distros = default_distros();
        let aggregate = aggregate_pipeline(&distros);
        match &aggregate.steps[0] {
            Node::Parallel(group) => {
                assert_eq!(
                    group.parallel[0].commands,
                    vec!["conveyor run --attach package:debian".to_string()]
                );
            }
            other => panic!("expected parallel group, got {:?}", other),
        }
    }

    #[test]
    fn first_packaging_step_is_non_blocking() {
        let pipeline = packaging_pipeline(&DistroSpec::new("debian", "deb", "deb"));
        match &pipeline.steps[0] {
            Node::Step(step) => assert!(step.non_blocking),
            other => panic!("expected step, got {:?}", other),
        }
    }

    #[test]
    fn starter_config_validates_cleanly() {
        let config = starter_config(&default_distros());
        let warnings = config::validate(&config).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn starter_yaml_round_trips() {
        let yaml = starter_yaml().unwrap();
        let parsed: ConfigFile = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, starter_config(&default_distros()));
    }

    #[test]
    fn upload_covers_every_format() {
        let distros = default_distros();
        let upload = upload_pipeline(&distros);
        match &upload.steps[0] {
            Node::Step(step) => {
                assert_eq!(step.commands.len(), distros.len());
                assert!(step.commands[1].contains("pkg.tar.zst"));
            }
            other => panic!("expected step, got {:?}", other),
        }
    }
}
