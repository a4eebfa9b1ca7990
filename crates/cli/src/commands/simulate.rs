//! Scripted simulation against an in-memory vehicle
//!
//! Runs the real [`ControlLoop`] on a paused tokio clock, so a script that
//! waits 500 ms finishes instantly and every write lands at an exact offset.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rckart_control::sensor::mock::MockOrientationSensor;
use rckart_control::{ControlCommand, ControlConfig, ControlCore, ControlLoop, ControlSnapshot};
use rckart_link::mock::{MockDevice, MockTransport, MockWrite};
use rckart_link::{DisconnectReason, LinkStats};
use rckart_protocol::{ActuatorChannel, decode_steering};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::commands::config::load_config;
use crate::commands::script::{Step, parse_lines, parse_script};
use crate::error::CliError;
use crate::output;

const DEFAULT_DEVICE_NAME: &str = "RCKart";
const SETTLE_YIELDS: usize = 16;

/// One payload the simulated vehicle received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Milliseconds since the simulation started.
    pub t_ms: u64,
    pub channel: &'static str,
    pub byte: u8,
    /// Decoded actuator value, if the byte is valid for its channel.
    pub value: Option<i16>,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub device: String,
    pub steps: usize,
    pub duration_ms: u64,
    pub frames: Vec<Frame>,
    pub snapshot: ControlSnapshot,
    pub stats: LinkStats,
}

pub async fn execute(
    script: Option<&Path>,
    steps: &[String],
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let parsed = match script {
        Some(path) => {
            let source = tokio::fs::read_to_string(path)
                .await
                .map_err(CliError::from)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            parse_script(&source)?
        }
        None => parse_lines(steps.iter().map(String::as_str))?,
    };
    if parsed.is_empty() {
        return Err(CliError::ValidationError(
            "nothing to simulate: pass --script FILE or at least one --step".to_string(),
        )
        .into());
    }
    let config = load_config(config_path).await?;

    tokio::time::pause();
    let report = run(config, &parsed).await?;
    output::print_simulation(&report, json);
    Ok(())
}

/// Play `steps` against a mock vehicle. The tokio clock must already be
/// paused.
pub async fn run(config: ControlConfig, steps: &[Step]) -> Result<SimulationReport> {
    let started = Instant::now();
    let name = config
        .link
        .name_prefix
        .clone()
        .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string());
    let device = MockDevice::with_services(Some(name.clone()), vec![config.link.service_uuid]);
    let sensor = MockOrientationSensor::new();
    let transport = Arc::new(MockTransport::with_device(device.clone()));
    let core = ControlCore::new(config.clone(), transport, Some(Arc::new(sensor.clone())));
    let (control, handle) = ControlLoop::new(core);
    let task = tokio::spawn(control.run());
    info!(device = %name, steps = steps.len(), "simulation started");

    for step in steps {
        debug!(?step, "step");
        match *step {
            Step::Command(command) => handle.send(command).await?,
            Step::TiltSample(gamma) => {
                if !sensor.push(rckart_input::TiltSample::gamma(gamma)) {
                    debug!(gamma, "tilt sample dropped, sensor not streaming");
                }
            }
            Step::SensorDeny => sensor.set_denied(Some("denied by script".to_string())),
            Step::Wait(duration) => tokio::time::sleep(duration).await,
            Step::DropLink => device.drop_link(DisconnectReason::LinkLoss),
        }
        settle().await;
    }

    let elapsed = started.elapsed();
    handle.send(ControlCommand::Shutdown).await?;
    let core = task.await.context("control loop task failed")?;
    let snapshot = core.snapshot();
    let stats = core.link().stats();

    let frames = device
        .writes()
        .iter()
        .map(|write| frame(&config, started, write))
        .collect();
    info!(elapsed_ms = elapsed.as_millis(), "simulation finished");

    Ok(SimulationReport {
        device: name,
        steps: steps.len(),
        duration_ms: millis(elapsed),
        frames,
        snapshot,
        stats,
    })
}

/// Give the control loop a chance to drain its queue without moving the
/// paused clock.
async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}

fn frame(config: &ControlConfig, started: Instant, write: &MockWrite) -> Frame {
    let byte = write.payload.first().copied().unwrap_or_default();
    let (channel, value) = if write.channel == config.link.channel_uuid(ActuatorChannel::Steering) {
        (
            ActuatorChannel::Steering.name(),
            decode_steering(&write.payload).ok().map(i16::from),
        )
    } else {
        (
            ActuatorChannel::Motor.name(),
            config.link.motor_encoding.decode(&write.payload).ok(),
        )
    };
    Frame {
        t_ms: millis(write.at.saturating_duration_since(started)),
        channel,
        byte,
        value,
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
