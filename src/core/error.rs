use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Duplicate pipeline name: {0}")]
    DuplicateName(String),

    #[error("Attach cycle detected: {0}")]
    CycleDetected(String),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Git error: {0}")]
    Git(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::PipelineNotFound(_) => "PIPELINE_NOT_FOUND",
            Error::DuplicateName(_) => "DUPLICATE_NAME",
            Error::CycleDetected(_) => "CYCLE_DETECTED",
            Error::Spawn { .. } => "SPAWN_FAILURE",
            Error::Git(_) => "GIT_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Toml(_) => "TOML_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::PipelineNotFound("x".into()).code(), "PIPELINE_NOT_FOUND");
        assert_eq!(Error::DuplicateName("x".into()).code(), "DUPLICATE_NAME");
        assert_eq!(Error::CycleDetected("a -> b -> a".into()).code(), "CYCLE_DETECTED");
    }

    #[test]
    fn spawn_carries_command_and_source() {
        let err = Error::Spawn {
            command: "docker build .".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.code(), "SPAWN_FAILURE");
        assert!(err.to_string().contains("docker build ."));
    }
}
