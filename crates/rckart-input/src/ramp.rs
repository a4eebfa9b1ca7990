//! Press-and-hold ramp timing for throttle and brake.
//!
//! While a pedal is held its timer fires every `period`, and each firing moves
//! the motor one `step` toward the pedal's bound. The controller never reads a
//! clock: the caller credits elapsed time through [`RampController::advance`]
//! and asks [`RampController::time_to_next_tick`] when to call again.
//!
//! ```
//! use core::time::Duration;
//! use rckart_input::{ActuatorState, RampConfig, RampController, RampDirection};
//!
//! let mut state = ActuatorState::default();
//! let mut ramp = RampController::new(RampConfig::default());
//!
//! ramp.start(RampDirection::Throttle);
//! ramp.advance(Duration::from_millis(500), &mut state);
//! assert_eq!(state.motor(), 50);
//! ```

use core::time::Duration;

use rckart_errors::ConfigError;
use rckart_protocol::{MOTOR_NEUTRAL, MotorRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::ActuatorState;

/// Pedal that drives a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampDirection {
    /// Accelerate toward full forward.
    Throttle,
    /// Decelerate toward the brake bound.
    Brake,
}

impl RampDirection {
    /// The other pedal.
    pub fn opposite(self) -> Self {
        match self {
            RampDirection::Throttle => RampDirection::Brake,
            RampDirection::Brake => RampDirection::Throttle,
        }
    }
}

impl core::fmt::Display for RampDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RampDirection::Throttle => write!(f, "throttle"),
            RampDirection::Brake => write!(f, "brake"),
        }
    }
}

/// What happens to the motor when a held pedal is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Keep the speed reached at release.
    HoldToCruise,
    /// Return to neutral as soon as the pedal is let go.
    #[default]
    DeadMan,
}

/// Where the brake pedal ramps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrakeMode {
    /// Through neutral to full reverse (range minimum).
    #[default]
    Reverse,
    /// Down to neutral and no further.
    Neutral,
}

/// Ramp tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Tick period while a pedal is held (milliseconds).
    pub period_ms: u64,
    /// Motor change per tick.
    pub step: u8,
    /// Motor behaviour on pedal release.
    pub release_policy: ReleasePolicy,
    /// Brake target.
    pub brake_mode: BrakeMode,
    /// Whether the brake pedal is available at all.
    pub dual_pedal: bool,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            period_ms: RampConfig::DEFAULT_PERIOD_MS,
            step: RampConfig::DEFAULT_STEP,
            release_policy: ReleasePolicy::default(),
            brake_mode: BrakeMode::default(),
            dual_pedal: true,
        }
    }
}

impl RampConfig {
    /// Default tick period (50ms).
    pub const DEFAULT_PERIOD_MS: u64 = 50;

    /// Default motor step per tick.
    pub const DEFAULT_STEP: u8 = 5;

    /// Largest meaningful step: neutral to either bound in one tick.
    pub const MAX_STEP: u8 = 200;

    /// Tick period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero period or a step of zero or
    /// above [`Self::MAX_STEP`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::invalid("ramp.period_ms must be greater than 0"));
        }
        if self.step == 0 {
            return Err(ConfigError::invalid("ramp.step must be greater than 0"));
        }
        if self.step > Self::MAX_STEP {
            return Err(ConfigError::invalid(format!(
                "ramp.step must be at most {}",
                Self::MAX_STEP
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> RampConfigBuilder {
        RampConfigBuilder::default()
    }
}

/// Builder for `RampConfig`.
#[derive(Debug, Default)]
pub struct RampConfigBuilder {
    config: RampConfig,
}

impl RampConfigBuilder {
    /// Set the tick period in milliseconds.
    #[must_use]
    pub fn period_ms(mut self, ms: u64) -> Self {
        self.config.period_ms = ms;
        self
    }

    /// Set the motor step per tick.
    #[must_use]
    pub fn step(mut self, step: u8) -> Self {
        self.config.step = step;
        self
    }

    /// Set the release policy.
    #[must_use]
    pub fn release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.config.release_policy = policy;
        self
    }

    /// Set the brake mode.
    #[must_use]
    pub fn brake_mode(mut self, mode: BrakeMode) -> Self {
        self.config.brake_mode = mode;
        self
    }

    /// Enable or disable the brake pedal.
    #[must_use]
    pub fn dual_pedal(mut self, enabled: bool) -> Self {
        self.config.dual_pedal = enabled;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<RampConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build without validation.
    #[must_use]
    pub fn build_unchecked(self) -> RampConfig {
        self.config
    }
}

/// A periodic timer driven by explicit elapsed time.
///
/// Inactive timers ignore time. Starting an active timer or stopping an
/// inactive one does nothing.
#[derive(Debug, Clone)]
pub struct RampTimer {
    period: Duration,
    /// Time since the last tick; `None` while inactive.
    elapsed: Option<Duration>,
}

impl RampTimer {
    /// Create an inactive timer. A zero period is treated as one nanosecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_nanos(1)),
            elapsed: None,
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the timer is running.
    pub fn is_active(&self) -> bool {
        self.elapsed.is_some()
    }

    /// Start the timer. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.elapsed.is_some() {
            return false;
        }
        self.elapsed = Some(Duration::ZERO);
        true
    }

    /// Cancel the timer. Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        self.elapsed.take().is_some()
    }

    /// Credit elapsed time and return how many ticks fell due.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        let Some(elapsed) = self.elapsed else {
            return 0;
        };
        let total = elapsed.saturating_add(delta).as_nanos();
        let period = self.period.as_nanos();
        let ticks = total / period;
        let remainder = total % period;
        self.elapsed = Some(Duration::from_nanos(
            u64::try_from(remainder).unwrap_or(u64::MAX),
        ));
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Time until the next tick, or `None` while inactive.
    pub fn time_to_next_tick(&self) -> Option<Duration> {
        self.elapsed.map(|elapsed| self.period.saturating_sub(elapsed))
    }
}

/// Throttle/brake ramp state machine.
///
/// Each direction is either idle or ramping. The pedals are mutually
/// exclusive: pressing one cancels the other without applying the release
/// policy.
#[derive(Debug, Clone)]
pub struct RampController {
    config: RampConfig,
    throttle: RampTimer,
    brake: RampTimer,
}

impl RampController {
    /// Create an idle controller.
    pub fn new(config: RampConfig) -> Self {
        let period = config.period();
        Self {
            config,
            throttle: RampTimer::new(period),
            brake: RampTimer::new(period),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RampConfig {
        &self.config
    }

    /// Whether a direction is ramping.
    pub fn is_active(&self, direction: RampDirection) -> bool {
        self.timer(direction).is_active()
    }

    /// Whether either direction is ramping.
    pub fn any_active(&self) -> bool {
        self.throttle.is_active() || self.brake.is_active()
    }

    /// Begin ramping a direction.
    ///
    /// Returns `false` if the direction was already ramping, or if it is the
    /// brake and the brake pedal is disabled.
    pub fn start(&mut self, direction: RampDirection) -> bool {
        if direction == RampDirection::Brake && !self.config.dual_pedal {
            debug!("brake press ignored, dual pedal disabled");
            return false;
        }
        if self.timer(direction).is_active() {
            return false;
        }
        if self.timer_mut(direction.opposite()).stop() {
            debug!(cancelled = %direction.opposite(), "pedal superseded");
        }
        self.timer_mut(direction).start();
        info!(%direction, "ramp started");
        true
    }

    /// Stop ramping a direction and apply the release policy.
    ///
    /// Stopping an idle direction does nothing and returns `false`.
    pub fn stop(&mut self, direction: RampDirection, state: &mut ActuatorState) -> bool {
        if !self.timer_mut(direction).stop() {
            return false;
        }
        match self.config.release_policy {
            ReleasePolicy::HoldToCruise => {}
            ReleasePolicy::DeadMan => {
                state.stop_motor();
            }
        }
        info!(%direction, motor = state.motor(), "ramp stopped");
        true
    }

    /// Cancel both ramps and force the motor to neutral.
    pub fn emergency_stop(&mut self, state: &mut ActuatorState) {
        self.cancel_all();
        state.stop_motor();
    }

    /// Cancel both ramps without touching the motor.
    pub fn cancel_all(&mut self) {
        self.throttle.stop();
        self.brake.stop();
    }

    /// Credit elapsed time and apply every tick that fell due.
    ///
    /// Returns the number of ticks applied. Once the motor reaches a
    /// direction's bound, further ticks hold it there.
    pub fn advance(&mut self, delta: Duration, state: &mut ActuatorState) -> u32 {
        let mut applied = 0u32;
        for direction in [RampDirection::Throttle, RampDirection::Brake] {
            let ticks = self.timer_mut(direction).advance(delta);
            if ticks == 0 {
                continue;
            }
            let bound = self.bound(direction, state.motor_range());
            step_toward(state, bound, self.config.step, ticks);
            applied = applied.saturating_add(ticks);
        }
        applied
    }

    /// Time until the earliest pending tick, or `None` while idle.
    pub fn time_to_next_tick(&self) -> Option<Duration> {
        match (
            self.throttle.time_to_next_tick(),
            self.brake.time_to_next_tick(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Motor value a direction ramps toward.
    pub fn bound(&self, direction: RampDirection, range: MotorRange) -> i16 {
        match direction {
            RampDirection::Throttle => range.max,
            RampDirection::Brake => match self.config.brake_mode {
                BrakeMode::Reverse => range.min,
                BrakeMode::Neutral => MOTOR_NEUTRAL.max(range.min),
            },
        }
    }

    fn timer(&self, direction: RampDirection) -> &RampTimer {
        match direction {
            RampDirection::Throttle => &self.throttle,
            RampDirection::Brake => &self.brake,
        }
    }

    fn timer_mut(&mut self, direction: RampDirection) -> &mut RampTimer {
        match direction {
            RampDirection::Throttle => &mut self.throttle,
            RampDirection::Brake => &mut self.brake,
        }
    }
}

fn step_toward(state: &mut ActuatorState, bound: i16, step: u8, ticks: u32) {
    let current = i32::from(state.motor());
    let bound = i32::from(bound);
    let delta = i32::from(step).saturating_mul(i32::try_from(ticks).unwrap_or(i32::MAX));
    let next = if bound >= current {
        current.saturating_add(delta).min(bound)
    } else {
        current.saturating_sub(delta).max(bound)
    };
    state.set_motor(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    fn controller(policy: ReleasePolicy) -> RampController {
        RampController::new(RampConfig::builder().release_policy(policy).build_unchecked())
    }

    #[test]
    fn test_timer_counts_whole_periods() {
        let mut timer = RampTimer::new(TICK);
        assert_eq!(timer.advance(TICK), 0, "inactive timer ignores time");
        assert!(timer.start());
        assert!(!timer.start());
        assert_eq!(timer.advance(Duration::from_millis(49)), 0);
        assert_eq!(timer.time_to_next_tick(), Some(Duration::from_millis(1)));
        assert_eq!(timer.advance(Duration::from_millis(1)), 1);
        assert_eq!(timer.advance(Duration::from_millis(125)), 2);
        assert_eq!(timer.time_to_next_tick(), Some(Duration::from_millis(25)));
        assert!(timer.stop());
        assert!(!timer.stop());
        assert_eq!(timer.time_to_next_tick(), None);
    }

    #[test]
    fn test_throttle_saturates_at_max() {
        let mut state = ActuatorState::default();
        let mut ramp = controller(ReleasePolicy::DeadMan);
        ramp.start(RampDirection::Throttle);
        for _ in 0..20 {
            ramp.advance(TICK, &mut state);
        }
        assert_eq!(state.motor(), 100);
        for _ in 0..10 {
            ramp.advance(TICK, &mut state);
        }
        assert_eq!(state.motor(), 100);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut state = ActuatorState::default();
        let mut ramp = controller(ReleasePolicy::DeadMan);
        assert!(ramp.start(RampDirection::Throttle));
        ramp.advance(Duration::from_millis(30), &mut state);
        assert!(!ramp.start(RampDirection::Throttle));
        // the repeated press did not restart the period
        ramp.advance(Duration::from_millis(20), &mut state);
        assert_eq!(state.motor(), 5);
    }

    #[test]
    fn test_release_policies() {
        for (policy, expected) in [(ReleasePolicy::HoldToCruise, 50), (ReleasePolicy::DeadMan, 0)] {
            let mut state = ActuatorState::default();
            let mut ramp = controller(policy);
            ramp.start(RampDirection::Throttle);
            assert_eq!(ramp.advance(Duration::from_millis(500), &mut state), 10);
            assert_eq!(state.motor(), 50);
            assert!(ramp.stop(RampDirection::Throttle, &mut state));
            assert_eq!(state.motor(), expected, "{policy:?}");
        }
    }

    #[test]
    fn test_stop_idle_direction_skips_policy() {
        let mut state = ActuatorState::default();
        state.set_motor(40);
        let mut ramp = controller(ReleasePolicy::DeadMan);
        assert!(!ramp.stop(RampDirection::Throttle, &mut state));
        assert_eq!(state.motor(), 40);
    }

    #[test]
    fn test_emergency_stop_mid_ramp() {
        let mut state = ActuatorState::default();
        let mut ramp = controller(ReleasePolicy::HoldToCruise);
        ramp.start(RampDirection::Throttle);
        ramp.advance(Duration::from_millis(300), &mut state);
        ramp.emergency_stop(&mut state);
        assert_eq!(state.motor(), 0);
        assert!(!ramp.any_active());
        assert_eq!(ramp.time_to_next_tick(), None);
        assert_eq!(ramp.advance(Duration::from_secs(10), &mut state), 0);
        assert_eq!(state.motor(), 0);
    }

    #[test]
    fn test_brake_reverse_and_neutral() {
        let mut state = ActuatorState::default();
        let mut ramp = RampController::new(RampConfig::default());
        ramp.start(RampDirection::Brake);
        ramp.advance(Duration::from_secs(5), &mut state);
        assert_eq!(state.motor(), -100);

        let mut state = ActuatorState::default();
        state.set_motor(30);
        let mut ramp = RampController::new(
            RampConfig::builder()
                .brake_mode(BrakeMode::Neutral)
                .build_unchecked(),
        );
        ramp.start(RampDirection::Brake);
        ramp.advance(Duration::from_millis(100), &mut state);
        assert_eq!(state.motor(), 20);
        ramp.advance(Duration::from_secs(5), &mut state);
        assert_eq!(state.motor(), 0);
    }

    #[test]
    fn test_brake_floor_in_forward_only_range() {
        let mut state = ActuatorState::new(MotorRange::FORWARD_ONLY);
        state.set_motor(20);
        let mut ramp = RampController::new(RampConfig::default());
        ramp.start(RampDirection::Brake);
        ramp.advance(Duration::from_secs(1), &mut state);
        assert_eq!(state.motor(), 0);
    }

    #[test]
    fn test_pedals_are_mutually_exclusive() {
        let mut state = ActuatorState::default();
        let mut ramp = controller(ReleasePolicy::DeadMan);
        ramp.start(RampDirection::Throttle);
        ramp.advance(Duration::from_millis(200), &mut state);
        assert_eq!(state.motor(), 20);
        assert!(ramp.start(RampDirection::Brake));
        assert!(!ramp.is_active(RampDirection::Throttle));
        // cancelling the throttle did not apply dead-man
        assert_eq!(state.motor(), 20);
        ramp.advance(Duration::from_millis(100), &mut state);
        assert_eq!(state.motor(), 10);
    }

    #[test]
    fn test_brake_ignored_without_dual_pedal() {
        let mut state = ActuatorState::default();
        let config = RampConfig::builder().dual_pedal(false).build_unchecked();
        let mut ramp = RampController::new(config);
        assert!(!ramp.start(RampDirection::Brake));
        assert_eq!(ramp.advance(Duration::from_secs(1), &mut state), 0);
        assert_eq!(state.motor(), 0);
    }

    #[test]
    fn test_config_validation() {
        assert!(RampConfig::default().validate().is_ok());
        assert!(RampConfig::builder().period_ms(0).build().is_err());
        assert!(RampConfig::builder().step(0).build().is_err());
        assert!(RampConfig::builder().step(201).build().is_err());
        assert!(RampConfig::builder().step(200).build().is_ok());
    }

    #[test]
    fn test_config_serde() -> Result<(), serde_json::Error> {
        let config: RampConfig =
            serde_json::from_str(r#"{"release_policy":"hold_to_cruise","brake_mode":"neutral"}"#)?;
        assert_eq!(config.release_policy, ReleasePolicy::HoldToCruise);
        assert_eq!(config.brake_mode, BrakeMode::Neutral);
        assert_eq!(config.period_ms, 50);
        assert_eq!(config.step, 5);
        Ok(())
    }
}
