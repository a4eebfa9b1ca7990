//! Payload encode/decode commands

use std::path::Path;

use anyhow::Result;
use rckart_protocol::{ActuatorChannel, MotorEncoding, decode_steering, encode_steering};
use serde::Serialize;

use crate::commands::config::load_config;
use crate::commands::{DecodeCommands, EncodeCommands, EncodingArg};
use crate::error::CliError;
use crate::output;

/// One actuator value and its wire byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadReport {
    pub channel: ActuatorChannel,
    pub value: i16,
    pub byte: u8,
    /// Motor encoding used; `None` for steering.
    pub encoding: Option<MotorEncoding>,
}

pub async fn execute_encode(
    cmd: &EncodeCommands,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let report = match cmd {
        EncodeCommands::Steering { angle } => encode_steering_value(*angle)?,
        EncodeCommands::Motor { speed, encoding } => {
            let encoding = resolve_encoding(*encoding, config_path).await?;
            encode_motor_value(*speed, encoding)?
        }
    };
    output::print_payload(&report, json);
    Ok(())
}

pub async fn execute_decode(
    cmd: &DecodeCommands,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let report = match cmd {
        DecodeCommands::Steering { byte } => {
            let angle = decode_steering(&[*byte]).map_err(validation)?;
            PayloadReport {
                channel: ActuatorChannel::Steering,
                value: i16::from(angle),
                byte: *byte,
                encoding: None,
            }
        }
        DecodeCommands::Motor { byte, encoding } => {
            let encoding = resolve_encoding(*encoding, config_path).await?;
            let speed = encoding.decode(&[*byte]).map_err(validation)?;
            PayloadReport {
                channel: ActuatorChannel::Motor,
                value: speed,
                byte: *byte,
                encoding: Some(encoding),
            }
        }
    };
    output::print_payload(&report, json);
    Ok(())
}

/// An explicit `--encoding` wins over the configured one.
async fn resolve_encoding(
    arg: Option<EncodingArg>,
    config_path: Option<&Path>,
) -> Result<MotorEncoding, CliError> {
    match arg {
        Some(arg) => Ok(arg.into()),
        None => Ok(load_config(config_path).await?.link.motor_encoding),
    }
}

fn encode_steering_value(angle: i32) -> Result<PayloadReport, CliError> {
    let narrow = u8::try_from(angle)
        .map_err(|err| CliError::ValidationError(format!("steering angle {angle}: {err}")))?;
    let [byte] = encode_steering(narrow).map_err(validation)?;
    Ok(PayloadReport {
        channel: ActuatorChannel::Steering,
        value: i16::from(narrow),
        byte,
        encoding: None,
    })
}

fn encode_motor_value(speed: i32, encoding: MotorEncoding) -> Result<PayloadReport, CliError> {
    let narrow = i16::try_from(speed)
        .map_err(|err| CliError::ValidationError(format!("motor speed {speed}: {err}")))?;
    let [byte] = encoding.encode(narrow).map_err(validation)?;
    Ok(PayloadReport {
        channel: ActuatorChannel::Motor,
        value: narrow,
        byte,
        encoding: Some(encoding),
    })
}

fn validation(err: rckart_protocol::ProtocolError) -> CliError {
    CliError::ValidationError(err.to_string())
}
