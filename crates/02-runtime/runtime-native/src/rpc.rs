//! Newline-delimited JSON RPC over TCP.
//!
//! Requests are `{"id", "method", "params"}` and responses are
//! `{"id", "result", "error"}`, one object per line.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};
use transport_fabric::{RpcClient, RpcHandler, RpcReply, RpcServer, TransportError, TransportResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Serialize, Deserialize)]
struct Request {
    id: u64,
    method: String,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Connects per call to an external application's RPC endpoint.
pub struct TcpRpcClient {
    addr: SocketAddr,
    timeout: Duration,
    next_id: AtomicU64,
}

impl TcpRpcClient {
    pub fn new(host: &str, port: u16, timeout: Duration) -> TransportResult<Self> {
        let endpoint = format!("{host}:{port}");
        let addr = endpoint
            .to_socket_addrs()
            .map_err(|err| TransportError::Connect {
                endpoint: endpoint.clone(),
                reason: err.to_string(),
            })?
            .next()
            .ok_or_else(|| TransportError::Connect {
                endpoint,
                reason: "no address resolved".into(),
            })?;
        Ok(Self {
            addr,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    fn exchange(&self, method: &str, params: Vec<Value>) -> TransportResult<RpcReply> {
        let stream =
            TcpStream::connect_timeout(&self.addr, self.timeout).map_err(|err| {
                TransportError::Connect {
                    endpoint: self.endpoint(),
                    reason: err.to_string(),
                }
            })?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request {
            id,
            method: method.to_string(),
            params,
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|err| TransportError::rpc(method, err.to_string()))?;
        line.push('\n');
        (&stream).write_all(line.as_bytes())?;

        let mut reader = BufReader::new(&stream);
        let mut reply = String::new();
        match reader.read_line(&mut reply) {
            Ok(0) => return Err(TransportError::closed(self.endpoint())),
            Ok(_) => {}
            Err(err) if is_timeout(&err) => {
                return Err(TransportError::Timeout {
                    waiting_for: format!("reply to `{method}` from {}", self.endpoint()),
                    after: self.timeout,
                })
            }
            Err(err) => return Err(err.into()),
        }

        let response: Response = serde_json::from_str(reply.trim_end())
            .map_err(|err| TransportError::rpc(method, format!("malformed reply: {err}")))?;
        if response.id != id {
            return Err(TransportError::rpc(
                method,
                format!("reply id {} does not match request id {id}", response.id),
            ));
        }
        trace!(method, id, "rpc reply received");
        Ok(RpcReply {
            value: response.result,
            error: response.error,
        })
    }
}

impl RpcClient for TcpRpcClient {
    fn call(&self, method: &str, params: Vec<Value>) -> RpcReply {
        self.exchange(method, params)
            .unwrap_or_else(|err| RpcReply::failed(err.to_string()))
    }

    fn endpoint(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

struct Running {
    stop: Arc<AtomicBool>,
    local: SocketAddr,
    accept: JoinHandle<()>,
}

/// Locally hosted RPC listener. Each connection is served on its own thread.
pub struct TcpRpcServer {
    bind: SocketAddr,
    running: Option<Running>,
}

impl TcpRpcServer {
    /// Listener on the loopback interface. Port `0` picks an ephemeral port.
    pub fn new(port: u16) -> Self {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    pub fn bind(addr: SocketAddr) -> Self {
        Self {
            bind: addr,
            running: None,
        }
    }
}

impl RpcServer for TcpRpcServer {
    fn start(&mut self, handler: Arc<dyn RpcHandler>) -> TransportResult<()> {
        if self.running.is_some() {
            return Ok(());
        }
        let listener = TcpListener::bind(self.bind).map_err(|err| TransportError::Connect {
            endpoint: self.bind.to_string(),
            reason: err.to_string(),
        })?;
        listener.set_nonblocking(true)?;
        let local = listener.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&stop);
        let accept = thread::Builder::new()
            .name(format!("rpc-accept-{}", local.port()))
            .spawn(move || accept_loop(listener, handler, flag))?;
        info!(%local, "rpc server listening");

        self.running = Some(Running {
            stop,
            local,
            accept,
        });
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running.stop.store(true, Ordering::Release);
        if running.accept.join().is_err() {
            warn!(local = %running.local, "rpc accept thread panicked");
        }
        info!(local = %running.local, "rpc server stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local)
    }
}

impl Drop for TcpRpcServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn accept_loop(listener: TcpListener, handler: Arc<dyn RpcHandler>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "rpc connection accepted");
                let handler = Arc::clone(&handler);
                let stop = Arc::clone(&stop);
                let spawned = thread::Builder::new()
                    .name(format!("rpc-conn-{peer}"))
                    .spawn(move || {
                        if let Err(err) = serve_connection(stream, handler.as_ref(), &stop) {
                            debug!(%peer, error = %err, "rpc connection ended");
                        }
                    });
                if let Err(err) = spawned {
                    warn!(%peer, error = %err, "could not spawn rpc connection thread");
                }
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                warn!(error = %err, "rpc accept failed");
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn serve_connection(
    stream: TcpStream,
    handler: &dyn RpcHandler,
    stop: &AtomicBool,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(POLL_INTERVAL * 5))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        if stop.load(Ordering::Acquire) {
            return Ok(());
        }
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            // A partial line stays buffered in `line` across timeouts.
            Err(err) if is_timeout(&err) => continue,
            Err(err) => return Err(err),
        }

        let response = match serde_json::from_str::<Request>(line.trim_end()) {
            Ok(request) => {
                trace!(method = %request.method, id = request.id, "rpc request");
                match handler.handle(&request.method, &request.params) {
                    Ok(result) => Response {
                        id: request.id,
                        result: Some(result),
                        error: None,
                    },
                    Err(reason) => Response {
                        id: request.id,
                        result: None,
                        error: Some(reason),
                    },
                }
            }
            Err(err) => Response {
                id: 0,
                result: None,
                error: Some(format!("malformed request: {err}")),
            },
        };
        line.clear();

        let mut out = serde_json::to_string(&response)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        out.push('\n');
        writer.write_all(out.as_bytes())?;
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
