//! Link configuration.

use rckart_errors::ConfigError;
use rckart_protocol::{
    ActuatorChannel, MOTOR_CHANNEL_UUID, MotorEncoding, MotorRange, SERVICE_UUID,
    STEERING_CHANNEL_UUID,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transport::DeviceFilter;

/// Identifiers and wire options for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Primary service the vehicle advertises.
    pub service_uuid: Uuid,
    /// Steering channel under the service.
    pub steering_channel_uuid: Uuid,
    /// Motor channel under the service.
    pub motor_channel_uuid: Uuid,
    /// Only offer devices whose name starts with this prefix.
    pub name_prefix: Option<String>,
    /// Motor byte encoding of the vehicle firmware.
    pub motor_encoding: MotorEncoding,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            service_uuid: SERVICE_UUID,
            steering_channel_uuid: STEERING_CHANNEL_UUID,
            motor_channel_uuid: MOTOR_CHANNEL_UUID,
            name_prefix: None,
            motor_encoding: MotorEncoding::default(),
        }
    }
}

impl LinkConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the two channels share an
    /// identifier, a channel reuses the service identifier, or the name
    /// prefix is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steering_channel_uuid == self.motor_channel_uuid {
            return Err(ConfigError::invalid(
                "link.steering_channel_uuid and link.motor_channel_uuid must differ",
            ));
        }
        if self.steering_channel_uuid == self.service_uuid
            || self.motor_channel_uuid == self.service_uuid
        {
            return Err(ConfigError::invalid(
                "link channel identifiers must differ from link.service_uuid",
            ));
        }
        if self
            .name_prefix
            .as_deref()
            .is_some_and(|prefix| prefix.trim().is_empty())
        {
            return Err(ConfigError::invalid("link.name_prefix must not be empty"));
        }
        Ok(())
    }

    /// Device filter for this vehicle.
    pub fn filter(&self) -> DeviceFilter {
        let filter = DeviceFilter::service(self.service_uuid);
        match &self.name_prefix {
            Some(prefix) => filter.with_name_prefix(prefix.clone()),
            None => filter,
        }
    }

    /// Channel identifier for an actuator.
    pub fn channel_uuid(&self, channel: ActuatorChannel) -> Uuid {
        match channel {
            ActuatorChannel::Steering => self.steering_channel_uuid,
            ActuatorChannel::Motor => self.motor_channel_uuid,
        }
    }

    /// Motor domain implied by the encoding.
    pub fn motor_range(&self) -> MotorRange {
        self.motor_encoding.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LinkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.motor_range(), MotorRange::BIDIRECTIONAL);
        assert_eq!(config.filter(), DeviceFilter::service(SERVICE_UUID));
    }

    #[test]
    fn test_rejects_shared_channel_ids() {
        let config = LinkConfig {
            motor_channel_uuid: STEERING_CHANNEL_UUID,
            ..LinkConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_prefix() {
        let config = LinkConfig {
            name_prefix: Some("  ".to_string()),
            ..LinkConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<(), serde_json::Error> {
        let config: LinkConfig =
            serde_json::from_str(r#"{"name_prefix":"RCKart","motor_encoding":"unsigned"}"#)?;
        assert_eq!(config.service_uuid, SERVICE_UUID);
        assert_eq!(config.motor_range(), MotorRange::FORWARD_ONLY);
        assert_eq!(config.filter().name_prefix.as_deref(), Some("RCKart"));
        Ok(())
    }
}
