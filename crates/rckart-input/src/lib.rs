//! Input handling for the RC kart control core.
//!
//! - [`mapper`]: pure tilt and slider to steering conversions
//! - [`types`]: the clamped [`ActuatorState`] the rest of the core mutates
//! - [`ramp`]: throttle/brake press-and-hold ramp timing
//!
//! Nothing here touches time or I/O directly. The ramp controller is advanced
//! with explicit durations, so the async control loop and the tests drive it
//! the same way.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod mapper;
pub mod ramp;
pub mod types;

pub use mapper::{
    DEFAULT_TILT_LIMIT_DEG, TiltSmoother, map_slider_to_steering, map_tilt_to_steering,
    map_tilt_to_steering_with_limit,
};
pub use ramp::{
    BrakeMode, RampConfig, RampConfigBuilder, RampController, RampDirection, RampTimer,
    ReleasePolicy,
};
pub use types::{ActuatorState, TiltSample};
