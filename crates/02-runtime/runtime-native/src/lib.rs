//! Native implementations of the transport seams.
//!
//! * [`NativeLauncher`] – `std::process` launcher whose handles scan stdout for readiness lines.
//! * [`TcpRpcClient`] / [`TcpRpcServer`] – newline-delimited JSON request/response over TCP.
//! * [`UdpPacketSocket`] – one datagram per frame.
//! * [`BatchHandoff`] / [`discover_install`] – file hand-off and install-root discovery.

mod batch;
mod process;
mod rpc;
mod udp;

pub use batch::{discover_install, BatchHandoff, DiscoveryError, Installation};
pub use process::{NativeLauncher, NativeProcess};
pub use rpc::{TcpRpcClient, TcpRpcServer};
pub use udp::UdpPacketSocket;
