//! RC kart actuator wire format.
//!
//! The onboard controller exposes one service with two write-only channels,
//! one per actuator. Every command is a single unsigned byte written to the
//! matching channel; there is no framing, sequence number or checksum.
//!
//! # Channels
//! | Channel  | Domain        | Encoding                                   |
//! |----------|---------------|--------------------------------------------|
//! | steering | 0 … 180 deg   | byte = angle                               |
//! | motor    | −100 … 100 %  | byte = speed + 100 ([`MotorEncoding::SignedOffset`]) |
//! | motor    | 0 … 100 %     | byte = speed ([`MotorEncoding::Unsigned`]) |
//!
//! Which motor encoding applies is a property of the vehicle firmware and is
//! fixed per deployment, never inferred at runtime.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod ids;

pub use encoding::{
    MOTOR_NEUTRAL, MotorEncoding, MotorRange, PAYLOAD_LEN, Payload, ProtocolError,
    STEERING_CENTER, STEERING_MAX, STEERING_MIN, decode_steering, encode_steering,
};
pub use ids::{ActuatorChannel, MOTOR_CHANNEL_UUID, SERVICE_UUID, STEERING_CHANNEL_UUID};
