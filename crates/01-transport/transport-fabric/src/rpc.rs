//! Request/response seam used by RPC-driven interop plugins.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{TransportError, TransportResult};

/// Outcome of a remote call.
///
/// Failures travel in `error` next to the call rather than as a panic or an
/// `Err`, mirroring how external applications report problems. A reply with
/// no `error` is the only evidence of success.
#[must_use = "a reply may carry an error that must be checked"]
#[derive(Clone, Debug, PartialEq)]
pub struct RpcReply {
    pub value: Option<Value>,
    pub error: Option<String>,
}

impl RpcReply {
    pub fn ok(value: Value) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Converts the reply into a `Result`, attributing failures to `method`.
    pub fn into_result(self, method: &str) -> TransportResult<Value> {
        match self.error {
            Some(reason) => Err(TransportError::rpc(method, reason)),
            None => Ok(self.value.unwrap_or(Value::Null)),
        }
    }
}

/// Client half: calls named methods on an external application.
pub trait RpcClient: Send + Sync {
    fn call(&self, method: &str, params: Vec<Value>) -> RpcReply;

    /// Human-readable peer description for diagnostics.
    fn endpoint(&self) -> String;
}

/// Server half: answers calls made by an external application.
pub trait RpcHandler: Send + Sync + 'static {
    fn handle(&self, method: &str, params: &[Value]) -> Result<Value, String>;
}

/// Locally hosted listener owned by one interop interface.
pub trait RpcServer: Send {
    fn start(&mut self, handler: Arc<dyn RpcHandler>) -> TransportResult<()>;
    fn stop(&mut self) -> TransportResult<()>;
    fn is_running(&self) -> bool;
    fn local_addr(&self) -> Option<SocketAddr>;
}
