use std::sync::Arc;
use std::time::Duration;

use interop_simple::LOAD_METHOD;
use message_abi::Message;
use parking_lot::Mutex;
use runtime_native::{TcpRpcServer, UdpPacketSocket};
use serde_json::{json, Value};
use testdata::{free_tcp_port, free_udp_port};
use transport_codecs::BinaryMessageCodec;
use transport_fabric::{PacketSocket, RpcHandler, RpcServer};

pub const WAIT: Duration = Duration::from_secs(2);

/// RPC endpoint standing in for an external training application.
#[derive(Default)]
pub struct FakeApplication {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeApplication {
    /// Starts serving on an ephemeral loopback port.
    pub fn serve() -> (Arc<Self>, TcpRpcServer, u16) {
        let app = Arc::new(Self::default());
        let mut server = TcpRpcServer::new(0);
        server.start(app.clone()).unwrap();
        let port = server.local_addr().unwrap().port();
        (app, server, port)
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }
}

impl RpcHandler for FakeApplication {
    fn handle(&self, method: &str, params: &[Value]) -> Result<Value, String> {
        self.calls.lock().push((method.to_string(), params.to_vec()));
        if method == LOAD_METHOD && params.first() == Some(&json!("missing")) {
            return Err("no such scenario".into());
        }
        Ok(json!(0))
    }
}

/// Simulator end of a triage interface's datagram link.
pub struct Simulator {
    socket: UdpPacketSocket,
    pub interface_port: u16,
}

impl Simulator {
    pub fn new() -> Self {
        let interface_port = free_udp_port();
        let socket = UdpPacketSocket::bind(0, "127.0.0.1", interface_port).unwrap();
        Self {
            socket,
            interface_port,
        }
    }

    pub fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    pub fn next(&self) -> Message {
        let bytes = self
            .socket
            .recv(WAIT)
            .unwrap()
            .expect("frame from interface");
        BinaryMessageCodec.decode_frame(&bytes).unwrap()
    }

    pub fn report(&self, message: &Message) {
        let frame = BinaryMessageCodec.encode_frame(message).unwrap();
        self.socket.send(&frame).unwrap();
    }
}

pub fn simple_entry(ref_id: u32, name: &str, app_port: u16, marker: &str) -> String {
    format!(
        r#"
[[interop]]
ref_id = {ref_id}
name = "{name}"
implementation = "interop.simple.SimpleExampleInterface"
training_application = "simple-example"

[interop.input]
kind = "rpc"
local_port = {local}
external_port = {app_port}
program = "simple-example-app"
ready_marker = "{marker}"
ready_timeout_ms = 200
"#,
        local = free_tcp_port(),
    )
}

pub fn triage_entry(ref_id: u32, name: &str, implementation: &str, sim: &Simulator) -> String {
    format!(
        r#"
[[interop]]
ref_id = {ref_id}
name = "{name}"
implementation = "{implementation}"
training_application = "triage-sim"

[interop.input]
kind = "packet"
local_port = {local}
peer_port = {peer}
recv_timeout_ms = 20
"#,
        local = sim.interface_port,
        peer = sim.port(),
    )
}
