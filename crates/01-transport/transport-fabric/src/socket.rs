use std::net::SocketAddr;
use std::time::Duration;

use crate::error::TransportResult;

/// Datagram-style transport: each `send` is one frame, each `recv` yields one frame.
pub trait PacketSocket: Send + Sync {
    fn send(&self, bytes: &[u8]) -> TransportResult<()>;

    /// Waits up to `timeout` for a packet. `Ok(None)` means nothing arrived.
    fn recv(&self, timeout: Duration) -> TransportResult<Option<Vec<u8>>>;

    fn local_addr(&self) -> TransportResult<SocketAddr>;
}
