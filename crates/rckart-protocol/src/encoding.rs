//! Single-byte actuator payload encoding.
//!
//! Encoders reject values outside the channel domain instead of clamping.
//! Clamping happens in the input mapping layer before a value gets here.

use serde::{Deserialize, Serialize};

use crate::ids::ActuatorChannel;

/// Length of every actuator payload in bytes.
pub const PAYLOAD_LEN: usize = 1;

/// Wire payload for one actuator write.
pub type Payload = [u8; PAYLOAD_LEN];

/// Minimum steering angle in degrees (full left).
pub const STEERING_MIN: u8 = 0;

/// Maximum steering angle in degrees (full right).
pub const STEERING_MAX: u8 = 180;

/// Straight-ahead steering angle.
pub const STEERING_CENTER: u8 = 90;

/// Motor value that de-energises the drive.
pub const MOTOR_NEUTRAL: i16 = 0;

const MOTOR_LIMIT: i16 = 100;
const SIGNED_OFFSET: i16 = 100;

/// Errors returned by payload encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Value lies outside the channel's declared domain.
    OutOfRange {
        channel: ActuatorChannel,
        value: i32,
        min: i32,
        max: i32,
    },
    /// Payload has the wrong number of bytes.
    InvalidLength { got: usize, need: usize },
    /// Payload byte does not map back into the channel domain.
    InvalidByte { channel: ActuatorChannel, byte: u8 },
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolError::OutOfRange {
                channel,
                value,
                min,
                max,
            } => write!(f, "{channel} value {value} outside [{min}, {max}]"),
            ProtocolError::InvalidLength { got, need } => {
                write!(f, "payload length {got}, expected {need}")
            }
            ProtocolError::InvalidByte { channel, byte } => {
                write!(f, "{channel} payload byte {byte:#04x} is not a valid command")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Inclusive motor value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorRange {
    pub min: i16,
    pub max: i16,
}

impl MotorRange {
    /// Forward and reverse, −100 … 100.
    pub const BIDIRECTIONAL: MotorRange = MotorRange {
        min: -MOTOR_LIMIT,
        max: MOTOR_LIMIT,
    };

    /// Forward only, 0 … 100.
    pub const FORWARD_ONLY: MotorRange = MotorRange {
        min: MOTOR_NEUTRAL,
        max: MOTOR_LIMIT,
    };

    pub fn contains(self, value: i16) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamp an arbitrary (possibly wide) value into the range.
    pub fn clamp(self, value: i32) -> i16 {
        let clamped = value.clamp(i32::from(self.min), i32::from(self.max));
        i16::try_from(clamped).unwrap_or(MOTOR_NEUTRAL)
    }

    /// Whether the drive can run in reverse.
    pub fn is_bidirectional(self) -> bool {
        self.min < MOTOR_NEUTRAL
    }
}

/// Motor byte encoding, fixed per vehicle firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorEncoding {
    /// Speed −100 … 100 sent as `speed + 100` (bytes 0 … 200, 100 = stop).
    #[default]
    SignedOffset,
    /// Speed 0 … 100 sent unchanged.
    Unsigned,
}

impl MotorEncoding {
    /// Motor domain accepted by this encoding.
    pub const fn range(self) -> MotorRange {
        match self {
            MotorEncoding::SignedOffset => MotorRange::BIDIRECTIONAL,
            MotorEncoding::Unsigned => MotorRange::FORWARD_ONLY,
        }
    }

    /// Encode a motor speed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OutOfRange`] if `speed` is outside [`Self::range`].
    pub fn encode(self, speed: i16) -> Result<Payload, ProtocolError> {
        let range = self.range();
        let out_of_range = ProtocolError::OutOfRange {
            channel: ActuatorChannel::Motor,
            value: i32::from(speed),
            min: i32::from(range.min),
            max: i32::from(range.max),
        };
        if !range.contains(speed) {
            return Err(out_of_range);
        }
        let wire = match self {
            MotorEncoding::SignedOffset => i32::from(speed) + i32::from(SIGNED_OFFSET),
            MotorEncoding::Unsigned => i32::from(speed),
        };
        let Ok(byte) = u8::try_from(wire) else {
            return Err(out_of_range);
        };
        Ok([byte])
    }

    /// Decode a motor payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidLength`] for a payload that is not
    /// exactly one byte and [`ProtocolError::InvalidByte`] for a byte outside
    /// the encoding's wire range.
    pub fn decode(self, payload: &[u8]) -> Result<i16, ProtocolError> {
        let byte = single_byte(payload)?;
        let speed = match self {
            MotorEncoding::SignedOffset => i16::from(byte) - SIGNED_OFFSET,
            MotorEncoding::Unsigned => i16::from(byte),
        };
        if self.range().contains(speed) {
            Ok(speed)
        } else {
            Err(ProtocolError::InvalidByte {
                channel: ActuatorChannel::Motor,
                byte,
            })
        }
    }
}

/// Encode a steering angle.
///
/// # Errors
///
/// Returns [`ProtocolError::OutOfRange`] if `angle` exceeds [`STEERING_MAX`].
pub fn encode_steering(angle: u8) -> Result<Payload, ProtocolError> {
    if angle > STEERING_MAX {
        return Err(ProtocolError::OutOfRange {
            channel: ActuatorChannel::Steering,
            value: i32::from(angle),
            min: i32::from(STEERING_MIN),
            max: i32::from(STEERING_MAX),
        });
    }
    Ok([angle])
}

/// Decode a steering payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidLength`] for a payload that is not exactly
/// one byte and [`ProtocolError::InvalidByte`] for a byte above [`STEERING_MAX`].
pub fn decode_steering(payload: &[u8]) -> Result<u8, ProtocolError> {
    let byte = single_byte(payload)?;
    if byte > STEERING_MAX {
        return Err(ProtocolError::InvalidByte {
            channel: ActuatorChannel::Steering,
            byte,
        });
    }
    Ok(byte)
}

fn single_byte(payload: &[u8]) -> Result<u8, ProtocolError> {
    match payload {
        [byte] => Ok(*byte),
        _ => Err(ProtocolError::InvalidLength {
            got: payload.len(),
            need: PAYLOAD_LEN,
        }),
    }
}
