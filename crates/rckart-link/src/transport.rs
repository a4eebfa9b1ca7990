//! Radio transport abstraction.
//!
//! Mirrors the shape of a GATT-style stack: pick a device matching a filter,
//! open a session, resolve write channels by service and channel identifier.

use std::sync::Arc;

use async_trait::async_trait;
use rckart_errors::LinkResult;
use uuid::Uuid;

/// Why a device link went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The local side asked for the disconnect.
    Requested,
    /// The vehicle closed the link.
    Remote,
    /// Supervision timeout, usually out of range or powered off.
    LinkLoss,
    /// Transport-specific reason.
    Other(String),
}

impl core::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DisconnectReason::Requested => write!(f, "disconnect requested"),
            DisconnectReason::Remote => write!(f, "closed by vehicle"),
            DisconnectReason::LinkLoss => write!(f, "link lost"),
            DisconnectReason::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Callback invoked once when a connected device drops.
pub type DisconnectCallback = Box<dyn FnOnce(DisconnectReason) + Send>;

/// Device selection criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceFilter {
    /// Services the device must advertise.
    pub services: Vec<Uuid>,
    /// Required advertised name prefix.
    pub name_prefix: Option<String>,
}

impl DeviceFilter {
    /// Filter on a single advertised service.
    pub fn service(service: Uuid) -> Self {
        Self {
            services: vec![service],
            name_prefix: None,
        }
    }

    /// Additionally require a name prefix.
    #[must_use]
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Whether an advertisement satisfies the filter.
    pub fn matches(&self, name: Option<&str>, advertised: &[Uuid]) -> bool {
        let services_ok = self.services.iter().all(|s| advertised.contains(s));
        let name_ok = match (&self.name_prefix, name) {
            (None, _) => true,
            (Some(prefix), Some(name)) => name.starts_with(prefix.as_str()),
            (Some(_), None) => false,
        };
        services_ok && name_ok
    }
}

/// Entry point into the radio stack.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Select a device. May involve a user-facing chooser; dismissing it
    /// yields `LinkError::Cancelled`.
    async fn request_device(&self, filter: &DeviceFilter) -> LinkResult<Arc<dyn Device>>;
}

/// A selected, not necessarily connected, device.
#[async_trait]
pub trait Device: Send + Sync {
    /// Advertised name, if any.
    fn name(&self) -> Option<String>;

    /// Open a session with the device.
    async fn connect(&self) -> LinkResult<Box<dyn Session>>;

    /// Register a callback fired when the link drops.
    fn on_disconnected(&self, callback: DisconnectCallback);

    /// Close the link. Closing an unconnected device does nothing.
    async fn disconnect(&self);
}

/// An open session with a device.
#[async_trait]
pub trait Session: Send + Sync {
    /// Resolve a write channel under a service.
    async fn channel(&self, service: Uuid, id: Uuid) -> LinkResult<Arc<dyn Channel>>;
}

/// A writable actuator channel.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Write one payload.
    async fn write(&self, payload: &[u8]) -> LinkResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rckart_protocol::SERVICE_UUID;

    #[test]
    fn test_filter_requires_all_services() {
        let filter = DeviceFilter::service(SERVICE_UUID);
        assert!(filter.matches(None, &[SERVICE_UUID]));
        assert!(!filter.matches(Some("Kart"), &[]));
    }

    #[test]
    fn test_filter_name_prefix() {
        let filter = DeviceFilter::service(SERVICE_UUID).with_name_prefix("RCKart");
        assert!(filter.matches(Some("RCKart-7"), &[SERVICE_UUID]));
        assert!(!filter.matches(Some("Other"), &[SERVICE_UUID]));
        assert!(!filter.matches(None, &[SERVICE_UUID]));
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(DisconnectReason::LinkLoss.to_string(), "link lost");
        assert_eq!(
            DisconnectReason::Other("battery".to_string()).to_string(),
            "battery"
        );
    }
}
