//! Configuration error types.

use std::path::PathBuf;

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON/YAML for the schema
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The configuration parsed but holds an invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for a path.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::parse("kart.yaml", "unknown field `speed`");
        assert_eq!(
            err.to_string(),
            "Failed to parse kart.yaml: unknown field `speed`"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = ConfigError::io(
            "missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }
}
