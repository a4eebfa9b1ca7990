//! Link to the kart's onboard controller.
//!
//! [`LinkSession`] owns the connection lifecycle
//! (`Disconnected → Connecting → Connected`, with `Error` on a failed attempt)
//! and the two actuator channel handles. Sends are gated on the lifecycle: a
//! write is only attempted while connected, and a failed write is logged and
//! counted, never escalated.
//!
//! The radio stack itself sits behind the [`Transport`] family of traits.
//! [`mock`] provides an in-memory vehicle for tests and simulation.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod mock;
pub mod session;
pub mod transport;

pub use config::LinkConfig;
pub use session::{ConnectionState, LinkSession, LinkStats, LinkStatus};
pub use transport::{
    Channel, Device, DeviceFilter, DisconnectCallback, DisconnectReason, Session, Transport,
};

pub use rckart_errors::{LinkError, LinkResult};
