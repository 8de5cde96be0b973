//! CLI response formatting and output.
//!
//! Provides the JSON envelope, printing, and exit code mapping.

use conveyor::{Error, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(e.into());
    }
    Ok(())
}

pub fn print_json_result(result: Result<serde_json::Value>) {
    let outcome = match result {
        Ok(data) => print_response(&CliResponse::success(data)),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    };
    if let Err(e) = outcome {
        eprintln!("conveyor: failed to write response: {}", e);
    }
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (Err(err.into()), 1),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(&err);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_for_error(err: &Error) -> i32 {
    match err {
        Error::Config(_)
        | Error::DuplicateName(_)
        | Error::Json(_)
        | Error::Yaml(_)
        | Error::Toml(_) => 2,

        Error::PipelineNotFound(_) => 4,

        Error::CycleDetected(_) => 5,

        Error::Spawn { .. } | Error::Git(_) => 20,

        Error::Io(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_carries_code_and_message() {
        let err = Error::PipelineNotFound("make:packages".to_string());
        let response = CliResponse::<()>::from_error(&err);
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, "PIPELINE_NOT_FOUND");
        assert!(error.message.contains("make:packages"));
    }

    #[test]
    fn exit_codes_by_error_kind() {
        assert_eq!(exit_code_for_error(&Error::Config("x".into())), 2);
        assert_eq!(exit_code_for_error(&Error::DuplicateName("x".into())), 2);
        assert_eq!(exit_code_for_error(&Error::PipelineNotFound("x".into())), 4);
        assert_eq!(exit_code_for_error(&Error::CycleDetected("x".into())), 5);
        assert_eq!(
            exit_code_for_error(&Error::Git("no repo".into())),
            20
        );
    }

    #[test]
    fn success_result_keeps_command_exit_code() {
        let (value, code) = map_cmd_result_to_json(Ok(("done", 7)));
        assert_eq!(code, 7);
        assert_eq!(value.unwrap(), serde_json::json!("done"));
    }
}
