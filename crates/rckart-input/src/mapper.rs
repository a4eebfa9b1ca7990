//! Tilt and slider to steering conversion.
//!
//! All mappers are total: out-of-range or non-finite input is clamped to a
//! valid angle, never rejected.

use rckart_protocol::{STEERING_CENTER, STEERING_MAX, STEERING_MIN};

/// Tilt (degrees either side of level) that maps to full lock.
pub const DEFAULT_TILT_LIMIT_DEG: f32 = 45.0;

/// Map device left/right tilt (gamma, degrees) to a steering angle.
///
/// Gamma is clamped to ±45°, then rescaled linearly so that −45° is full
/// left (0), level is center (90) and +45° is full right (180).
///
/// # Example
///
/// ```
/// use rckart_input::map_tilt_to_steering;
///
/// assert_eq!(map_tilt_to_steering(-45.0), 0);
/// assert_eq!(map_tilt_to_steering(0.0), 90);
/// assert_eq!(map_tilt_to_steering(90.0), 180);
/// ```
pub fn map_tilt_to_steering(gamma: f32) -> u8 {
    map_tilt_to_steering_with_limit(gamma, DEFAULT_TILT_LIMIT_DEG)
}

/// Map tilt to steering with a custom full-lock tilt.
///
/// A non-finite or non-positive `limit_deg` falls back to
/// [`DEFAULT_TILT_LIMIT_DEG`]. A non-finite `gamma` maps to center.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "scaled is finite and within 0 ..= 180 before the cast"
)]
pub fn map_tilt_to_steering_with_limit(gamma: f32, limit_deg: f32) -> u8 {
    if !gamma.is_finite() {
        return STEERING_CENTER;
    }
    let limit = if limit_deg.is_finite() && limit_deg > 0.0 {
        limit_deg
    } else {
        DEFAULT_TILT_LIMIT_DEG
    };
    let clamped = gamma.clamp(-limit, limit);
    let span = f32::from(STEERING_MAX - STEERING_MIN);
    let scaled = (clamped + limit) / (2.0 * limit) * span + f32::from(STEERING_MIN);
    (scaled.round() as u8).clamp(STEERING_MIN, STEERING_MAX)
}

/// Map a raw slider position to a steering angle.
///
/// Identity on 0 … 180; anything outside is clamped to the nearest bound.
pub fn map_slider_to_steering(raw: i32) -> u8 {
    let clamped = raw.clamp(i32::from(STEERING_MIN), i32::from(STEERING_MAX));
    u8::try_from(clamped).unwrap_or(STEERING_CENTER)
}

/// Exponential smoothing for tilt samples.
///
/// `alpha` is the weight of the newest sample: 1.0 passes samples through
/// unchanged, smaller values trade latency for noise rejection.
#[derive(Debug, Clone)]
pub struct TiltSmoother {
    alpha: f32,
    state: Option<f32>,
}

impl TiltSmoother {
    /// Create a smoother. `alpha` is clamped into (0, 1]; a non-finite value
    /// disables smoothing.
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f32::EPSILON, 1.0)
        } else {
            1.0
        };
        Self { alpha, state: None }
    }

    /// Pass-through smoother.
    pub fn passthrough() -> Self {
        Self::new(1.0)
    }

    /// Smoothing weight in use.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Feed one sample and return the filtered value.
    ///
    /// Returns `None` for a non-finite sample, which is dropped without
    /// touching the filter state.
    pub fn filter(&mut self, gamma: f32) -> Option<f32> {
        if !gamma.is_finite() {
            return None;
        }
        let next = match self.state {
            Some(prev) => prev + self.alpha * (gamma - prev),
            None => gamma,
        };
        self.state = Some(next);
        Some(next)
    }

    /// Forget the filter history, e.g. when tilt sensing is re-enabled.
    pub fn reset(&mut self) {
        self.state = None;
    }
}

impl Default for TiltSmoother {
    fn default() -> Self {
        Self::passthrough()
    }
}
