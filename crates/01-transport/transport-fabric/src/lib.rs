#![allow(missing_docs)]
//! Contracts shared by codecs and transport adapters.
//!
//! Nothing in here touches a socket or a process directly; the seams are
//! traits so that native runtimes and test doubles can slot in underneath the
//! interop plugins.

mod codec;
mod error;
mod process;
mod rpc;
mod socket;

pub use codec::{Codec, Encoded};
pub use error::{CodecError, CodecResult, TransportError, TransportResult};
pub use process::{shutdown_process, ExternalProcess, LaunchSpec, ProcessExit, ProcessLauncher};
pub use rpc::{RpcClient, RpcHandler, RpcReply, RpcServer};
pub use socket::PacketSocket;
