//! Error types for kartctl

use rckart_errors::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Script line {line}: {message}")]
    ScriptError { line: usize, message: String },

    #[error("File already exists: {0} (use --force to overwrite)")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::ValidationError(_)
            | CliError::Config(_)
            | CliError::ScriptError { .. }
            | CliError::JsonError(_) => 4,
            CliError::AlreadyExists(_) => 5,
            CliError::IoError(_) => 1,
        }
    }

    /// Short machine-readable name.
    pub fn type_name(&self) -> &'static str {
        match self {
            CliError::ValidationError(_) => "validation",
            CliError::Config(_) => "config",
            CliError::ScriptError { .. } => "script",
            CliError::AlreadyExists(_) => "already_exists",
            CliError::IoError(_) => "io",
            CliError::JsonError(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::ValidationError("x".into()).exit_code(), 4);
        assert_eq!(
            CliError::ScriptError {
                line: 3,
                message: "unknown step".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(CliError::AlreadyExists("kart.json".into()).exit_code(), 5);
    }

    #[test]
    fn test_error_messages() {
        insta::assert_snapshot!(
            CliError::ScriptError {
                line: 4,
                message: "unknown step \"launch\"".into()
            },
            @r#"Script line 4: unknown step "launch""#
        );
        insta::assert_snapshot!(
            CliError::AlreadyExists("kart.yaml".into()),
            @"File already exists: kart.yaml (use --force to overwrite)"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = CliError::from(ConfigError::invalid("ramp.step must be greater than 0"));
        assert_eq!(
            err.to_string(),
            "Invalid configuration: ramp.step must be greater than 0"
        );
    }
}
