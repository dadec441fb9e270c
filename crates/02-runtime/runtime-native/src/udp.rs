use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, trace};
use transport_fabric::{PacketSocket, TransportError, TransportResult};

/// Largest datagram accepted.
const MAX_DATAGRAM: usize = 64 * 1024;

/// UDP socket bound locally and paired with one remote peer.
pub struct UdpPacketSocket {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpPacketSocket {
    /// Binds `127.0.0.1:local_port` (`0` for ephemeral) and targets `peer_host:peer_port`.
    pub fn bind(local_port: u16, peer_host: &str, peer_port: u16) -> TransportResult<Self> {
        let endpoint = format!("{peer_host}:{peer_port}");
        let peer = endpoint
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| TransportError::Connect {
                endpoint: endpoint.clone(),
                reason: "peer address did not resolve".into(),
            })?;
        let local = SocketAddr::from(([127, 0, 0, 1], local_port));
        let socket = UdpSocket::bind(local).map_err(|err| TransportError::Connect {
            endpoint: local.to_string(),
            reason: err.to_string(),
        })?;
        debug!(local = ?socket.local_addr().ok(), %peer, "udp socket bound");
        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl PacketSocket for UdpPacketSocket {
    fn send(&self, bytes: &[u8]) -> TransportResult<()> {
        let sent = self.socket.send_to(bytes, self.peer)?;
        if sent != bytes.len() {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", bytes.len()),
            )));
        }
        trace!(peer = %self.peer, len = sent, "datagram sent");
        Ok(())
    }

    fn recv(&self, timeout: Duration) -> TransportResult<Option<Vec<u8>>> {
        // A zero timeout would mean "block forever".
        self.socket
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match self.socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                trace!(%from, len, "datagram received");
                buf.truncate(len);
                Ok(Some(buf))
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}
