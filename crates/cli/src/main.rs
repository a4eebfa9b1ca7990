//! kartctl - RC kart control core CLI
//!
//! Inspect and write vehicle configuration, check actuator payload bytes, and
//! replay input scripts against a simulated kart.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::*;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "kartctl")]
#[command(about = "RC kart control CLI - configuration, payload encoding and simulation")]
#[command(version)]
#[command(long_about = "
kartctl works with the RC kart control core without a vehicle or a phone.
It validates and writes configuration files, shows the byte each actuator
value is sent as, and replays scripted pedal, steering and tilt input
against a simulated kart on a virtual clock.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file applied to every command
    #[arg(long, global = true, env = "KARTCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration file commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show the payload byte for an actuator value
    #[command(subcommand)]
    Encode(EncodeCommands),

    /// Show the actuator value for a payload byte
    #[command(subcommand)]
    Decode(DecodeCommands),

    /// Replay an input script against a simulated kart
    Simulate {
        /// Script file, one step per line
        #[arg(short, long, conflicts_with = "step")]
        script: Option<PathBuf>,

        /// Inline step, repeatable (e.g. --step connect --step "wait 200")
        #[arg(long)]
        step: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.verbose).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<CliError>())
                .map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Log filter used when `RUST_LOG` is unset.
fn default_log_filter(verbose: u8) -> String {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!(
        "kartctl={log_level},rckart_control={log_level},\
         rckart_link={log_level},rckart_input={log_level}"
    )
}

async fn execute_command(cli: &Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Config(cmd) => commands::config::execute(cmd, config, cli.json).await,
        Commands::Encode(cmd) => commands::encode::execute_encode(cmd, config, cli.json).await,
        Commands::Decode(cmd) => commands::encode::execute_decode(cmd, config, cli.json).await,
        Commands::Simulate { script, step } => {
            commands::simulate::execute(script.as_deref(), step, config, cli.json).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    // --- Global flag parsing ---

    #[test]
    fn parse_config_show_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["kartctl", "config", "show"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Show { yaml: false })
        ));
        Ok(())
    }

    #[test]
    fn parse_global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from([
            "kartctl", "encode", "steering", "90", "--json", "-vv", "--config", "kart.yaml",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("kart.yaml")));
        Ok(())
    }

    #[test]
    fn default_filter_covers_every_crate() {
        let filter = default_log_filter(1);
        for target in ["kartctl", "rckart_control", "rckart_link", "rckart_input"] {
            assert!(filter.contains(&format!("{target}=info")), "{filter}");
        }
        assert!(default_log_filter(0).contains("rckart_input=warn"));
        assert!(default_log_filter(7).contains("rckart_input=trace"));
    }

    // --- Subcommands ---

    #[test]
    fn parse_encode_negative_motor_speed() -> TestResult {
        let cli = Cli::try_parse_from([
            "kartctl",
            "encode",
            "motor",
            "-40",
            "--encoding",
            "signed-offset",
        ])?;
        assert!(matches!(
            cli.command,
            Commands::Encode(EncodeCommands::Motor {
                speed: -40,
                encoding: Some(EncodingArg::SignedOffset)
            })
        ));
        Ok(())
    }

    #[test]
    fn parse_decode_hex_byte() -> TestResult {
        let cli = Cli::try_parse_from(["kartctl", "decode", "motor", "0x96"])?;
        assert!(matches!(
            cli.command,
            Commands::Decode(DecodeCommands::Motor {
                byte: 150,
                encoding: None
            })
        ));
        Ok(())
    }

    #[test]
    fn parse_config_init_force() -> TestResult {
        let cli = Cli::try_parse_from(["kartctl", "config", "init", "kart.json", "--force"])?;
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Init { force: true, .. })
        ));
        Ok(())
    }

    #[test]
    fn parse_simulate_steps() -> TestResult {
        let cli = Cli::try_parse_from([
            "kartctl", "simulate", "--step", "connect", "--step", "wait 200",
        ])?;
        match cli.command {
            Commands::Simulate { script, step } => {
                assert!(script.is_none());
                assert_eq!(step, vec!["connect", "wait 200"]);
            }
            _ => return Err("expected simulate".into()),
        }
        Ok(())
    }

    #[test]
    fn reject_script_with_steps() {
        let result = Cli::try_parse_from([
            "kartctl", "simulate", "--script", "s.txt", "--step", "connect",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn reject_unknown_encoding() {
        let result = Cli::try_parse_from([
            "kartctl", "encode", "motor", "10", "--encoding", "pwm",
        ]);
        assert!(result.is_err());
    }
}
