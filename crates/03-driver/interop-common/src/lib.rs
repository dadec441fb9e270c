//! Interop interface ABI shared by the hub and plugins.
//!
//! This crate defines the protocol boundary between the interop manager
//! (layer 05) and interop plugins (layer 04). Plugins implement
//! [`InteropInterface`] and are constructed through a [`PluginFactory`].

#![allow(missing_docs)]

mod context;
mod error;
mod input;
mod interface;
mod lifecycle;
mod registration;
mod teardown;

pub use context::{MessageSink, NoopWindow, PluginContext, PluginFactory, WindowControl};
pub use error::{ConfigurationError, InteropError, InteropResult};
pub use input::{BatchInput, InputKind, InteropInput, PacketInput, RpcInput};
pub use interface::{HandleOutcome, InteropInterface};
pub use lifecycle::{InteropCore, InteropState};
pub use registration::{Registration, RegistrationBuilder};
pub use teardown::Teardown;
