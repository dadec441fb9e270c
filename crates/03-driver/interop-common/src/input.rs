//! Transport configuration handed to `InteropInterface::configure`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    Rpc,
    Packet,
    Batch,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Rpc => "rpc",
            InputKind::Packet => "packet",
            InputKind::Batch => "batch",
        })
    }
}

/// One interface's input section, discriminated by `kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteropInput {
    Rpc(RpcInput),
    Packet(PacketInput),
    Batch(BatchInput),
}

impl InteropInput {
    pub fn kind(&self) -> InputKind {
        match self {
            InteropInput::Rpc(_) => InputKind::Rpc,
            InteropInput::Packet(_) => InputKind::Packet,
            InteropInput::Batch(_) => InputKind::Batch,
        }
    }

    pub fn as_rpc(&self) -> Result<&RpcInput, ConfigurationError> {
        match self {
            InteropInput::Rpc(input) => Ok(input),
            other => Err(other.wrong(InputKind::Rpc)),
        }
    }

    pub fn as_packet(&self) -> Result<&PacketInput, ConfigurationError> {
        match self {
            InteropInput::Packet(input) => Ok(input),
            other => Err(other.wrong(InputKind::Packet)),
        }
    }

    pub fn as_batch(&self) -> Result<&BatchInput, ConfigurationError> {
        match self {
            InteropInput::Batch(input) => Ok(input),
            other => Err(other.wrong(InputKind::Batch)),
        }
    }

    fn wrong(&self, expected: InputKind) -> ConfigurationError {
        ConfigurationError::WrongInput {
            expected,
            actual: self.kind(),
        }
    }
}

/// Bidirectional RPC: a local listener plus an external endpoint, with an
/// optional process to launch first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcInput {
    pub local_port: u16,
    #[serde(default = "loopback")]
    pub external_host: String,
    pub external_port: u16,
    #[serde(default)]
    pub program: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Stdout line fragment announcing the launched program is ready.
    #[serde(default)]
    pub ready_marker: Option<String>,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl RpcInput {
    pub fn new(local_port: u16, external_host: impl Into<String>, external_port: u16) -> Self {
        Self {
            local_port,
            external_host: external_host.into(),
            external_port,
            program: None,
            args: Vec::new(),
            ready_marker: None,
            ready_timeout_ms: default_ready_timeout_ms(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketInput {
    pub local_port: u16,
    #[serde(default = "loopback")]
    pub peer_host: String,
    pub peer_port: u16,
    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,
}

impl PacketInput {
    pub fn new(local_port: u16, peer_host: impl Into<String>, peer_port: u16) -> Self {
        Self {
            local_port,
            peer_host: peer_host.into(),
            peer_port,
            recv_timeout_ms: default_recv_timeout_ms(),
        }
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}

/// Launch-with-file applications found through an install-root variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInput {
    pub install_env: String,
    pub launch_script: PathBuf,
    #[serde(default)]
    pub handoff_dir: Option<PathBuf>,
    /// Scenario file name used when a LOAD carries no scenario argument.
    #[serde(default)]
    pub scenario: Option<String>,
    /// Whether a missing installation fails configuration instead of only
    /// marking the interface unavailable.
    #[serde(default = "yes")]
    pub required: bool,
}

impl BatchInput {
    pub fn new(install_env: impl Into<String>, launch_script: impl Into<PathBuf>) -> Self {
        Self {
            install_env: install_env.into(),
            launch_script: launch_script.into(),
            handoff_dir: None,
            scenario: None,
            required: true,
        }
    }
}

fn loopback() -> String {
    "127.0.0.1".to_string()
}

fn default_ready_timeout_ms() -> u64 {
    10_000
}

fn default_call_timeout_ms() -> u64 {
    2_000
}

fn default_recv_timeout_ms() -> u64 {
    100
}

fn yes() -> bool {
    true
}
