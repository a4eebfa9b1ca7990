//! Command implementations for kartctl

pub mod config;
pub mod encode;
pub mod script;
pub mod simulate;

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use rckart_protocol::MotorEncoding;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (defaults merged with --config)
    Show {
        /// Print YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },

    /// Load and validate a configuration file
    Validate {
        /// Configuration file (.json, .yaml or .yml)
        path: PathBuf,
    },

    /// Write the default configuration to a file
    Init {
        /// Destination file; the extension picks JSON or YAML
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum EncodeCommands {
    /// Encode a steering angle (0 … 180)
    Steering {
        /// Angle in degrees
        #[arg(allow_hyphen_values = true)]
        angle: i32,
    },

    /// Encode a motor speed
    Motor {
        /// Speed in percent
        #[arg(allow_hyphen_values = true)]
        speed: i32,
        /// Override the configured motor encoding
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DecodeCommands {
    /// Decode a steering payload byte
    Steering {
        /// Payload byte (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_byte)]
        byte: u8,
    },

    /// Decode a motor payload byte
    Motor {
        /// Payload byte (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_byte)]
        byte: u8,
        /// Override the configured motor encoding
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingArg {
    /// Speed −100 … 100 sent as speed + 100
    SignedOffset,
    /// Speed 0 … 100 sent unchanged
    Unsigned,
}

impl From<EncodingArg> for MotorEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::SignedOffset => MotorEncoding::SignedOffset,
            EncodingArg::Unsigned => MotorEncoding::Unsigned,
        }
    }
}

fn parse_byte(raw: &str) -> Result<u8, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => raw.parse::<u8>(),
    };
    parsed.map_err(|err| format!("{raw:?} is not a byte: {err}"))
}
