//! Socket plus receive thread for one enabled interface.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use interop_common::{InteropResult, MessageSink, PacketInput, Teardown};
use message_abi::{Message, MessageType, Payload};
use runtime_native::UdpPacketSocket;
use tracing::{debug, trace, warn};
use transport_codecs::BinaryMessageCodec;
use transport_fabric::{PacketSocket, TransportError};

use crate::CurrentScenario;

pub(crate) struct Link {
    socket: Arc<dyn PacketSocket>,
    stop: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
}

impl Link {
    pub fn open(
        interface: &str,
        input: &PacketInput,
        sink: MessageSink,
        current: CurrentScenario,
        produced: BTreeSet<MessageType>,
    ) -> InteropResult<Self> {
        let socket = UdpPacketSocket::bind(input.local_port, &input.peer_host, input.peer_port)?;
        Self::spawn(
            interface,
            Arc::new(socket),
            input.recv_timeout(),
            sink,
            current,
            produced,
        )
    }

    /// Starts the receive thread over an already bound socket.
    pub fn spawn(
        interface: &str,
        socket: Arc<dyn PacketSocket>,
        poll: Duration,
        sink: MessageSink,
        current: CurrentScenario,
        produced: BTreeSet<MessageType>,
    ) -> InteropResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let receiver = Receiver {
            interface: interface.to_string(),
            socket: Arc::clone(&socket),
            stop: Arc::clone(&stop),
            poll,
            sink,
            current,
            produced,
        };
        let handle = thread::Builder::new()
            .name(format!("triage-recv-{interface}"))
            .spawn(move || receiver.run())
            .map_err(TransportError::from)?;
        Ok(Self {
            socket,
            stop,
            receiver: Some(handle),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    pub fn send(&self, message: &Message) -> InteropResult<()> {
        let frame = BinaryMessageCodec.encode_frame(message)?;
        self.socket.send(&frame)?;
        trace!(message_type = %message.message_type(), len = frame.len(), "frame sent");
        Ok(())
    }

    pub fn close(mut self, teardown: &mut Teardown) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.receiver.take() {
            teardown.step(
                "join receiver",
                handle.join().map_err(|_| "receive thread panicked"),
            );
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

struct Receiver {
    interface: String,
    socket: Arc<dyn PacketSocket>,
    stop: Arc<AtomicBool>,
    poll: Duration,
    sink: MessageSink,
    current: CurrentScenario,
    produced: BTreeSet<MessageType>,
}

impl Receiver {
    fn run(self) {
        debug!(interface = %self.interface, "receive loop started");
        while !self.stop.load(Ordering::Acquire) {
            let bytes = match self.socket.recv(self.poll) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(err) => {
                    warn!(interface = %self.interface, error = %err, "receive failed");
                    thread::sleep(self.poll);
                    continue;
                }
            };
            let message = match BinaryMessageCodec.decode_frame(&bytes) {
                Ok(message) => message,
                Err(err) => {
                    warn!(
                        interface = %self.interface,
                        error = %err,
                        len = bytes.len(),
                        "dropping undecodable datagram"
                    );
                    continue;
                }
            };
            let message_type = message.message_type();
            if !self.produced.contains(&message_type) {
                warn!(
                    interface = %self.interface,
                    %message_type,
                    "dropping message type this interface does not produce"
                );
                continue;
            }
            if let Payload::ScenarioDefinition(scenario) = message.payload() {
                *self.current.lock() = Some(Arc::clone(scenario));
            }
            trace!(interface = %self.interface, %message_type, "message received");
            if !self.sink.deliver(message) {
                break;
            }
        }
        debug!(interface = %self.interface, "receive loop stopped");
    }
}
