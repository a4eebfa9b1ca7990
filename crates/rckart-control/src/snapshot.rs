//! Observable control state.

use rckart_input::ActuatorState;
use rckart_link::ConnectionState;
use serde::Serialize;

/// Everything presentation needs to render the remote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSnapshot {
    /// Link lifecycle state.
    pub connection: ConnectionState,
    /// Connected device name.
    pub device_name: Option<String>,
    /// Reason the last connect attempt failed.
    pub last_error: Option<String>,
    /// Why tilt steering could not be enabled or stopped.
    pub sensor_error: Option<String>,
    /// Informational message, e.g. an unexpected link drop.
    pub notice: Option<String>,
    /// Commanded actuator values.
    pub actuators: ActuatorState,
    /// Whether tilt steering is authoritative.
    pub tilt_enabled: bool,
    /// Throttle held.
    pub throttle_active: bool,
    /// Brake held.
    pub brake_active: bool,
}

impl ControlSnapshot {
    /// Whether commands reach the vehicle.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            device_name: None,
            last_error: None,
            sensor_error: None,
            notice: None,
            actuators: ActuatorState::default(),
            tilt_enabled: false,
            throttle_active: false,
            brake_active: false,
        }
    }
}
