//! Error taxonomy for the RC kart control core.
//!
//! Errors are grouped by the boundary they cross:
//!
//! - [`link`]: transport and connection lifecycle failures
//! - [`sensor`]: orientation sensor access failures
//! - [`config`]: configuration loading and validation failures
//! - [`common`]: the top-level [`KartError`] plus category and severity
//!   classification
//!
//! Nothing in this taxonomy is fatal to the process. Link and sensor errors
//! are caught at their boundary and turned into observable state; the worst
//! outcome is that commands stop flowing, which always resolves to a
//! de-energised motor.
//!
//! # Example
//!
//! ```
//! use rckart_errors::prelude::*;
//!
//! fn check_link(connected: bool) -> Result<()> {
//!     if !connected {
//!         return Err(LinkError::handshake("service not found").into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_link(false).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod common;
pub mod config;
pub mod link;
pub mod prelude;
pub mod sensor;

pub use common::{ErrorCategory, ErrorSeverity, KartError};
pub use config::ConfigError;
pub use link::LinkError;
pub use sensor::SensorError;

/// A specialized `Result` type for control core operations.
pub type Result<T> = std::result::Result<T, KartError>;

/// A specialized `Result` type for link and transport operations.
pub type LinkResult<T = ()> = std::result::Result<T, LinkError>;
