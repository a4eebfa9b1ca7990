//! Top-level error type and classification.

use core::fmt;

use crate::{ConfigError, LinkError, SensorError};

/// Top-level error wrapping every control core sub-error.
#[derive(Debug, thiserror::Error)]
pub enum KartError {
    /// Link and transport errors
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Orientation sensor errors
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl KartError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            KartError::Link(_) => ErrorCategory::Link,
            KartError::Sensor(_) => ErrorCategory::Sensor,
            KartError::Config(_) => ErrorCategory::Config,
            KartError::Other(_) => ErrorCategory::Other,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KartError::Link(e) => e.severity(),
            KartError::Sensor(e) => e.severity(),
            KartError::Config(_) => ErrorSeverity::Error,
            KartError::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Check if the control core can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        KartError::Other(msg.into())
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Link and transport errors
    Link = 0,
    /// Orientation sensor errors
    Sensor = 1,
    /// Configuration errors
    Config = 2,
    /// Other errors
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Link => write!(f, "Link"),
            ErrorCategory::Sensor => write!(f, "Sensor"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, control core may be in an unstable state
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Link.to_string(), "Link");
        assert_eq!(ErrorCategory::Sensor.to_string(), "Sensor");
        assert_eq!(ErrorCategory::Config.to_string(), "Config");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }

    #[test]
    fn test_kart_error_category() {
        let err: KartError = LinkError::Timeout.into();
        assert_eq!(err.category(), ErrorCategory::Link);

        let err: KartError = SensorError::permission_denied("blocked").into();
        assert_eq!(err.category(), ErrorCategory::Sensor);

        let err = KartError::other("test");
        assert_eq!(err.category(), ErrorCategory::Other);
    }

    #[test]
    fn test_nothing_in_the_taxonomy_is_critical() {
        let errors: Vec<KartError> = vec![
            LinkError::Timeout.into(),
            LinkError::disconnected("out of range").into(),
            LinkError::write_failed("gatt busy").into(),
            SensorError::StreamClosed.into(),
            ConfigError::invalid("ramp.step must be greater than 0").into(),
        ];
        for err in errors {
            assert!(err.is_recoverable(), "{err} should be recoverable");
        }
    }

    #[test]
    fn test_kart_error_is_std_error() {
        let err: KartError = LinkError::NoMatchingDevice.into();
        let _: &dyn std::error::Error = &err;
    }
}
