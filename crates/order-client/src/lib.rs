//! order-client
//!
//! Drives a single order through NEW → ACK → CANCEL → ACK against a
//! matching engine speaking the order-entry binary protocol.
//!
//! - [`config`]  : layered client configuration
//! - [`network`] : endpoints, connecting, frame-exact reads and writes
//! - [`session`] : the order lifecycle state machine
//! - [`error`]   : session errors

pub mod config;
pub mod error;
pub mod network;
pub mod session;

pub use config::{ClientConfig, ConfigError, OrderConfig, SideConfig};
pub use error::{Result, SessionError};
pub use network::{read_frame, write_frame, Endpoint};
pub use session::{CancelRequest, LifecycleReport, OrderSession, SessionOptions, SessionState};
