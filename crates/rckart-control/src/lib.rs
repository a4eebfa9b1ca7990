//! Control core for an RC kart remote.
//!
//! [`ControlCore`] turns discrete input events into actuator state and
//! streams that state to the vehicle through a [`rckart_link::LinkSession`].
//! [`ControlLoop`] drives the core from a single async task: user commands,
//! ramp deadlines, orientation samples and link status changes are all
//! handled in one place, so actuator state has exactly one writer.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rckart_control::{ControlCommand, ControlConfig, ControlCore, ControlLoop};
//! use rckart_link::mock::{MockDevice, MockTransport};
//!
//! # async fn demo() -> rckart_errors::Result<()> {
//! let transport = Arc::new(MockTransport::with_device(MockDevice::new("RCKart")));
//! let core = ControlCore::new(ControlConfig::default(), transport, None);
//! let (control, handle) = ControlLoop::new(core);
//! let task = tokio::spawn(control.run());
//!
//! handle.send(ControlCommand::Connect).await?;
//! handle.send(ControlCommand::PressThrottle).await?;
//! handle.send(ControlCommand::Shutdown).await?;
//! # let _ = task.await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod controller;
pub mod runtime;
pub mod sensor;
pub mod snapshot;

pub use config::{ControlConfig, ControlConfigBuilder, TiltConfig};
pub use controller::{ControlCore, TiltRequest};
pub use runtime::{ControlCommand, ControlHandle, ControlLoop};
pub use sensor::OrientationSensor;
pub use snapshot::ControlSnapshot;
