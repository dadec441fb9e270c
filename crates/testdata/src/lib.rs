//! Shared fixtures for interop gateway tests.
//!
//! Every fixture is deterministic: fixed timestamps, fixed ids, fixed ordering.
//! Network helpers hand out loopback ports the OS reports as free.

mod launcher;
mod messages;

pub use launcher::{LaunchRecord, ScriptedBehavior, ScriptedLauncher};

pub use messages::{
    display_feedback, environment_fog, every_message, lesson_completed, scenario,
    scenario_message, siman, siman_load, stop_freeze, timer_batch, triage, SIMPLE_IMPL,
    TRIAGE_IMPL,
};

use std::net::{TcpListener, UdpSocket};

/// Interop configuration declaring one interface per bundled plugin.
///
/// The second entry reuses ref id 1 and the third is unavailable, so loading
/// it exercises renumbering and skipping. Ports are placeholders; tests that
/// open sockets build their own configuration.
pub const SAMPLE_CONFIG: &str = r#"
[[interop]]
ref_id = 1
name = "Simple Example"
implementation = "interop.simple.SimpleExampleInterface"
training_application = "simple-example"

[interop.input]
kind = "rpc"
local_port = 0
external_host = "127.0.0.1"
external_port = 1

[[interop]]
ref_id = 1
name = "Triage Simulator"
implementation = "interop.triage.TriageSimInterface"
training_application = "triage-sim"

[interop.input]
kind = "packet"
local_port = 0
peer_host = "127.0.0.1"
peer_port = 1

[[interop]]
ref_id = 3
name = "Disabled Launcher"
implementation = "interop.batch.BatchLauncherInterface"
training_application = "batch-launcher"
available = false

[interop.input]
kind = "batch"
install_env = "TRAINING_LAUNCHER_HOME"
launch_script = "bin/launch.sh"
"#;

/// Loopback TCP port nothing is listening on at the time of the call.
pub fn free_tcp_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("bind ephemeral tcp port")
}

/// Loopback UDP port nothing is bound to at the time of the call.
pub fn free_udp_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .and_then(|socket| socket.local_addr())
        .map(|addr| addr.port())
        .expect("bind ephemeral udp port")
}
