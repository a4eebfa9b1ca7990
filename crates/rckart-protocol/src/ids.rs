//! Link identifiers for the kart controller.
//!
//! The controller firmware advertises a single primary service that groups
//! the two actuator channels. The values below match the stock firmware; a
//! deployment with reflashed identifiers overrides them through configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary service advertised by the kart controller.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x4faf_c201_1fb5_459e_8fcc_c5c9_c331_914b);

/// Steering servo channel (write, one byte).
pub const STEERING_CHANNEL_UUID: Uuid = Uuid::from_u128(0xbeb5_483e_36e1_4688_b7f5_ea07_361b_26a8);

/// Drive motor channel (write, one byte).
pub const MOTOR_CHANNEL_UUID: Uuid = Uuid::from_u128(0x1c95_d5e3_d8f7_413a_bf3d_7a2e_5d7b_e87e);

/// Actuator addressed by a channel write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorChannel {
    /// Steering servo.
    Steering,
    /// Drive motor.
    Motor,
}

impl ActuatorChannel {
    /// Stock channel identifier for this actuator.
    pub const fn default_uuid(self) -> Uuid {
        match self {
            ActuatorChannel::Steering => STEERING_CHANNEL_UUID,
            ActuatorChannel::Motor => MOTOR_CHANNEL_UUID,
        }
    }

    /// Short lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            ActuatorChannel::Steering => "steering",
            ActuatorChannel::Motor => "motor",
        }
    }
}

impl core::fmt::Display for ActuatorChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_distinct() {
        assert_ne!(SERVICE_UUID, STEERING_CHANNEL_UUID);
        assert_ne!(SERVICE_UUID, MOTOR_CHANNEL_UUID);
        assert_ne!(STEERING_CHANNEL_UUID, MOTOR_CHANNEL_UUID);
    }

    #[test]
    fn service_uuid_text_form() {
        assert_eq!(
            SERVICE_UUID.to_string(),
            "4fafc201-1fb5-459e-8fcc-c5c9c331914b"
        );
    }

    #[test]
    fn default_uuid_per_channel() {
        assert_eq!(
            ActuatorChannel::Steering.default_uuid(),
            STEERING_CHANNEL_UUID
        );
        assert_eq!(ActuatorChannel::Motor.default_uuid(), MOTOR_CHANNEL_UUID);
    }

    #[test]
    fn channel_display() {
        assert_eq!(ActuatorChannel::Steering.to_string(), "steering");
        assert_eq!(ActuatorChannel::Motor.to_string(), "motor");
    }
}
