//! Convenience re-exports for error handling.

pub use crate::{
    LinkResult, Result,
    common::{ErrorCategory, ErrorSeverity, KartError},
    config::ConfigError,
    link::LinkError,
    sensor::SensorError,
};
