//! Orientation sensor error types.

use crate::common::ErrorSeverity;

/// Orientation sensor errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorError {
    /// The platform refused sensor access
    #[error("Sensor permission denied: {0}")]
    PermissionDenied(String),

    /// The platform has no orientation sensor
    #[error("Orientation sensor unavailable: {0}")]
    Unavailable(String),

    /// The sample stream ended
    #[error("Orientation stream closed")]
    StreamClosed,
}

impl SensorError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SensorError::PermissionDenied(_) => ErrorSeverity::Warning,
            SensorError::Unavailable(_) => ErrorSeverity::Warning,
            SensorError::StreamClosed => ErrorSeverity::Info,
        }
    }

    /// Create a permission denied error.
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        SensorError::PermissionDenied(reason.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        SensorError::Unavailable(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_error_display() {
        let err = SensorError::permission_denied("user declined");
        assert_eq!(err.to_string(), "Sensor permission denied: user declined");
    }

    #[test]
    fn test_sensor_errors_are_not_fatal() {
        assert!(SensorError::unavailable("desktop").severity() < ErrorSeverity::Error);
        assert_eq!(SensorError::StreamClosed.severity(), ErrorSeverity::Info);
    }
}
