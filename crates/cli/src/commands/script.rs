//! Simulation script parsing
//!
//! One step per line, `#` starts a comment:
//!
//! ```text
//! connect
//! throttle        # press and hold
//! wait 500
//! release
//! steer 120
//! tilt-sample -30
//! drop
//! ```

use std::time::Duration;

use rckart_control::ControlCommand;

use crate::error::CliError;

/// One scripted action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Forward a command to the control loop.
    Command(ControlCommand),
    /// Feed one orientation sample (left/right tilt in degrees).
    TiltSample(f32),
    /// Make the orientation sensor refuse permission from now on.
    SensorDeny,
    /// Let simulated time pass.
    Wait(Duration),
    /// Drop the link from the vehicle side.
    DropLink,
}

/// Parse a whole script.
pub fn parse_script(source: &str) -> Result<Vec<Step>, CliError> {
    parse_lines(source.lines())
}

/// Parse steps given one per item, as with repeated `--step` flags.
pub fn parse_lines<'a, I>(lines: I) -> Result<Vec<Step>, CliError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut steps = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        if let Some(step) = parse_step(line).map_err(|message| CliError::ScriptError {
            line: index.saturating_add(1),
            message,
        })? {
            steps.push(step);
        }
    }
    Ok(steps)
}

/// Parse one line; blank and comment-only lines yield `None`.
fn parse_step(line: &str) -> Result<Option<Step>, String> {
    let code = line.split('#').next().unwrap_or_default();
    let mut words = code.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument {extra:?} after {keyword}"));
    }

    let step = match (keyword.to_ascii_lowercase().as_str(), argument) {
        ("connect", None) => Step::Command(ControlCommand::Connect),
        ("disconnect", None) => Step::Command(ControlCommand::Disconnect),
        ("throttle", None) => Step::Command(ControlCommand::PressThrottle),
        ("release", None) => Step::Command(ControlCommand::ReleaseThrottle),
        ("brake", None) => Step::Command(ControlCommand::PressBrake),
        ("release-brake", None) => Step::Command(ControlCommand::ReleaseBrake),
        ("tilt", None) => Step::Command(ControlCommand::ToggleTilt),
        ("estop", None) => Step::Command(ControlCommand::EmergencyStop),
        ("sensor-deny", None) => Step::SensorDeny,
        ("drop", None) => Step::DropLink,
        ("steer", Some(raw)) => Step::Command(ControlCommand::SetSteeringSlider(
            raw.parse::<i32>()
                .map_err(|err| format!("steer expects an integer, got {raw:?}: {err}"))?,
        )),
        ("tilt-sample", Some(raw)) => {
            let gamma = raw
                .parse::<f32>()
                .map_err(|err| format!("tilt-sample expects degrees, got {raw:?}: {err}"))?;
            Step::TiltSample(gamma)
        }
        ("wait", Some(raw)) => Step::Wait(Duration::from_millis(
            raw.parse::<u64>()
                .map_err(|err| format!("wait expects milliseconds, got {raw:?}: {err}"))?,
        )),
        ("steer" | "tilt-sample" | "wait", None) => {
            return Err(format!("{keyword} needs an argument"));
        }
        (
            "connect" | "disconnect" | "throttle" | "release" | "brake" | "release-brake" | "tilt"
            | "estop" | "sensor-deny" | "drop",
            Some(raw),
        ) => {
            return Err(format!("{keyword} takes no argument, got {raw:?}"));
        }
        _ => return Err(format!("unknown step {keyword:?}")),
    };
    Ok(Some(step))
}
