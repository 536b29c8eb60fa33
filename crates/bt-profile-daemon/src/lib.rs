//! A2DP stream-setup coordinator and HID dual-channel connector host
//! daemon, built on the wire-level types in `bt-classic`.

pub mod backend;
pub mod codec;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod driver;
pub mod error;
#[cfg(test)]
mod fakes;
pub mod hid;
pub mod ids;
pub mod ipc;
pub mod runtime;
pub mod sep;
pub mod setup;

pub use config::DaemonConfig;
pub use context::{Daemon, TimerAction};
pub use error::DaemonError;
