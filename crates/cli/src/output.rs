//! Output formatting for CLI responses

use std::path::Path;

use anyhow::Error;
use colored::*;
use rckart_control::{ControlConfig, ControlSnapshot};
use rckart_link::ConnectionState;
use serde_json::{Value, json};

use crate::commands::encode::PayloadReport;
use crate::commands::simulate::SimulationReport;
use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    emit(&error_json, "error");
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CliError>())
        .map_or("unknown", CliError::type_name)
}

fn emit(output: &Value, what: &str) {
    match serde_json::to_string_pretty(output) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format {} as JSON: {}", what, e),
    }
}

/// Print the effective configuration
pub fn print_config(config: &ControlConfig, source: Option<&Path>, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "source": source.map(|p| p.display().to_string()),
            "config": config
        });
        emit(&output, "configuration");
        return;
    }

    match source {
        Some(path) => println!("{} {}", "Configuration:".bold(), path.display()),
        None => println!("{} {}", "Configuration:".bold(), "(defaults)".dimmed()),
    }
    println!("  Schema: {}", config.schema_version);

    let link = &config.link;
    println!("{}", "Link".bold());
    println!("  Service:  {}", link.service_uuid);
    println!("  Steering: {}", link.steering_channel_uuid);
    println!("  Motor:    {}", link.motor_channel_uuid);
    println!(
        "  Name prefix: {}",
        link.name_prefix.as_deref().unwrap_or("(any)")
    );
    let range = link.motor_range();
    println!(
        "  Motor encoding: {:?} ({} … {})",
        link.motor_encoding, range.min, range.max
    );

    let ramp = &config.ramp;
    println!("{}", "Ramp".bold());
    println!("  Period: {} ms, step {}", ramp.period_ms, ramp.step);
    println!("  Release policy: {:?}", ramp.release_policy);
    println!("  Brake mode: {:?}", ramp.brake_mode);
    println!(
        "  Dual pedal: {}",
        if ramp.dual_pedal { "yes" } else { "no" }
    );

    println!("{}", "Tilt".bold());
    println!("  Limit: ±{}°", config.tilt.limit_deg);
    println!("  Smoothing: {}", config.tilt.smoothing);
}

/// Print a successful validation
pub fn print_config_valid(path: &Path, config: &ControlConfig, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "path": path.display().to_string(),
            "valid": true,
            "schema_version": config.schema_version
        });
        emit(&output, "validation result");
    } else {
        println!(
            "{} {} ({})",
            "✓".green(),
            path.display().to_string().bold(),
            config.schema_version.dimmed()
        );
    }
}

/// Print confirmation of a written configuration file
pub fn print_config_written(path: &Path, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "path": path.display().to_string()
        });
        emit(&output, "result");
    } else {
        println!(
            "{} Wrote default configuration to {}",
            "✓".green(),
            path.display().to_string().bold()
        );
    }
}

/// Print one encoded or decoded payload
pub fn print_payload(report: &PayloadReport, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "payload": report,
            "hex": format!("{:#04x}", report.byte)
        });
        emit(&output, "payload");
        return;
    }

    let unit = match report.encoding {
        None => "°",
        Some(_) => "%",
    };
    print!(
        "{} {}{} ⇄ byte {} ({:#04x})",
        report.channel.name().bold(),
        report.value,
        unit,
        report.byte,
        report.byte
    );
    match report.encoding {
        Some(encoding) => println!(" {}", format!("[{encoding:?}]").dimmed()),
        None => println!(),
    }
}

/// Print a simulation run
pub fn print_simulation(report: &SimulationReport, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "simulation": report
        });
        emit(&output, "simulation report");
        return;
    }

    println!(
        "{} {} steps, {} ms simulated against {}",
        "Simulation:".bold(),
        report.steps,
        report.duration_ms,
        report.device.bold()
    );

    if report.frames.is_empty() {
        println!("{}", "No frames written".yellow());
    } else {
        println!("{}", "Frames:".bold());
        for frame in &report.frames {
            let value = frame
                .value
                .map_or_else(|| "invalid".red().to_string(), |v| v.to_string());
            println!(
                "  {:>6} ms  {:<8}  {:#04x}  {}",
                frame.t_ms, frame.channel, frame.byte, value
            );
        }
    }

    print_snapshot(&report.snapshot);

    let stats = &report.stats;
    println!("{}", "Link stats:".bold());
    println!(
        "  {} writes, {} failed, {} connects, {} drops",
        stats.writes, stats.write_failures, stats.connects, stats.drops
    );
}

fn print_snapshot(snapshot: &ControlSnapshot) {
    let state = match &snapshot.connection {
        ConnectionState::Connected => "connected".green(),
        ConnectionState::Connecting => "connecting".yellow(),
        ConnectionState::Disconnected => "disconnected".dimmed(),
        ConnectionState::Error(_) => "error".red(),
    };
    println!("{} {}", "Final state:".bold(), state);
    println!(
        "  Steering {}°, motor {}%, tilt {}",
        snapshot.actuators.steering(),
        snapshot.actuators.motor(),
        if snapshot.tilt_enabled { "on" } else { "off" }
    );
    if let Some(err) = &snapshot.last_error {
        println!("  {} {}", "Last error:".red(), err);
    }
    if let Some(err) = &snapshot.sensor_error {
        println!("  {} {}", "Sensor:".yellow(), err);
    }
    if let Some(notice) = &snapshot.notice {
        println!("  {} {}", "Notice:".yellow(), notice);
    }
}
