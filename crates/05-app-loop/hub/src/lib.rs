//! Interop manager: owns every configured interface and drives their lifecycle.
//!
//! The manager is built from a TOML interop configuration and a registry of
//! plugin factories. All lifecycle calls run on the calling thread; each
//! interface owns its own transports and delivery threads.

mod config;
mod dispatch;
mod error;
mod manager;

pub use config::{parse_config, read_config, InteropConfig};
pub use dispatch::{DispatchReport, Reply, OPTIONAL_MESSAGE_TYPES};
pub use error::{Failure, Failures, HubError};
pub use manager::{InteropManager, InteropManagerBuilder};
