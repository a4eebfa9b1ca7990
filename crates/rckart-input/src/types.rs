//! Actuator state and sensor sample types.

use rckart_protocol::{MOTOR_NEUTRAL, MotorRange, STEERING_CENTER, STEERING_MAX};
use serde::{Deserialize, Serialize};

/// Commanded steering angle and motor speed.
///
/// Fields are private; every setter clamps, so a value outside the
/// steering domain or the configured [`MotorRange`] can never be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActuatorState {
    steering: u8,
    motor: i16,
    #[serde(skip)]
    range: MotorRange,
}

impl ActuatorState {
    /// Centered steering, neutral motor.
    pub fn new(range: MotorRange) -> Self {
        Self {
            steering: STEERING_CENTER,
            motor: MOTOR_NEUTRAL,
            range,
        }
    }

    /// Steering angle in degrees, 0 … 180.
    pub fn steering(&self) -> u8 {
        self.steering
    }

    /// Motor speed within [`Self::motor_range`].
    pub fn motor(&self) -> i16 {
        self.motor
    }

    /// Motor domain of the vehicle.
    pub fn motor_range(&self) -> MotorRange {
        self.range
    }

    /// Set steering, clamped to 0 … 180. Returns `true` if the value changed.
    pub fn set_steering(&mut self, angle: u8) -> bool {
        let angle = angle.min(STEERING_MAX);
        let changed = angle != self.steering;
        self.steering = angle;
        changed
    }

    /// Set motor speed, clamped to the motor range. Returns `true` if the
    /// value changed.
    pub fn set_motor(&mut self, speed: i32) -> bool {
        let speed = self.range.clamp(speed);
        let changed = speed != self.motor;
        self.motor = speed;
        changed
    }

    /// Force the motor to neutral.
    pub fn stop_motor(&mut self) -> bool {
        self.set_motor(i32::from(MOTOR_NEUTRAL))
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new(MotorRange::BIDIRECTIONAL)
    }
}

/// One orientation reading, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TiltSample {
    /// Left/right tilt, positive to the right.
    pub gamma: f32,
    /// Front/back tilt. Reported by the sensor, unused for steering.
    pub beta: f32,
}

impl TiltSample {
    /// Sample with only left/right tilt.
    pub fn gamma(gamma: f32) -> Self {
        Self { gamma, beta: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ActuatorState::default();
        assert_eq!(state.steering(), 90);
        assert_eq!(state.motor(), 0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut state = ActuatorState::new(MotorRange::BIDIRECTIONAL);
        state.set_steering(250);
        assert_eq!(state.steering(), 180);
        state.set_motor(1_000);
        assert_eq!(state.motor(), 100);
        state.set_motor(-1_000);
        assert_eq!(state.motor(), -100);
    }

    #[test]
    fn test_unsigned_range_floors_at_zero() {
        let mut state = ActuatorState::new(MotorRange::FORWARD_ONLY);
        state.set_motor(-30);
        assert_eq!(state.motor(), 0);
    }

    #[test]
    fn test_setters_report_change() {
        let mut state = ActuatorState::default();
        assert!(!state.set_steering(90));
        assert!(state.set_steering(100));
        assert!(state.set_motor(5));
        assert!(!state.set_motor(5));
        assert!(state.stop_motor());
        assert!(!state.stop_motor());
    }

    #[test]
    fn test_serializes_without_range() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&ActuatorState::default())?;
        assert_eq!(json, r#"{"steering":90,"motor":0}"#);
        Ok(())
    }
}
