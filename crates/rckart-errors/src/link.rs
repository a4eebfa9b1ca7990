//! Link and transport error types.
//!
//! Transport implementations report failures with these variants; the link
//! session adds the lifecycle-specific ones ([`LinkError::AlreadyConnecting`],
//! [`LinkError::Aborted`]).

use crate::common::ErrorSeverity;

/// Link lifecycle and transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// A connection attempt is already in flight
    #[error("A connection attempt is already in progress")]
    AlreadyConnecting,

    /// The user dismissed the device chooser
    #[error("Device selection was cancelled")]
    Cancelled,

    /// The transport gave up waiting for the device
    #[error("Connection timed out")]
    Timeout,

    /// No advertising device matched the filter
    #[error("No matching device found")]
    NoMatchingDevice,

    /// The device was found but the session could not be established
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The service does not expose a required channel
    #[error("Channel {channel} ({id}) is not available")]
    ChannelUnavailable {
        /// Actuator name of the channel
        channel: String,
        /// Channel identifier as text
        id: String,
    },

    /// The attempt was superseded by a disconnect or a link drop
    #[error("Connection attempt aborted")]
    Aborted,

    /// A single channel write failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The link went away
    #[error("Link disconnected: {0}")]
    Disconnected(String),
}

impl LinkError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LinkError::AlreadyConnecting => ErrorSeverity::Warning,
            LinkError::Cancelled => ErrorSeverity::Info,
            LinkError::Timeout => ErrorSeverity::Error,
            LinkError::NoMatchingDevice => ErrorSeverity::Error,
            LinkError::Handshake(_) => ErrorSeverity::Error,
            LinkError::ChannelUnavailable { .. } => ErrorSeverity::Error,
            LinkError::Aborted => ErrorSeverity::Info,
            LinkError::WriteFailed(_) => ErrorSeverity::Warning,
            LinkError::Disconnected(_) => ErrorSeverity::Info,
        }
    }

    /// Check if this error ends a connection attempt.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            LinkError::Cancelled
                | LinkError::Timeout
                | LinkError::NoMatchingDevice
                | LinkError::Handshake(_)
                | LinkError::ChannelUnavailable { .. }
        )
    }

    /// Check if a fresh `connect()` might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LinkError::Timeout
                | LinkError::Handshake(_)
                | LinkError::NoMatchingDevice
                | LinkError::Disconnected(_)
        )
    }

    /// Create a handshake error.
    pub fn handshake(reason: impl Into<String>) -> Self {
        LinkError::Handshake(reason.into())
    }

    /// Create a channel unavailable error.
    pub fn channel_unavailable(channel: impl Into<String>, id: impl Into<String>) -> Self {
        LinkError::ChannelUnavailable {
            channel: channel.into(),
            id: id.into(),
        }
    }

    /// Create a write failure.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        LinkError::WriteFailed(reason.into())
    }

    /// Create a disconnected error.
    pub fn disconnected(reason: impl Into<String>) -> Self {
        LinkError::Disconnected(reason.into())
    }
}
