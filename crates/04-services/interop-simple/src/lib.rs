//! Interop plugin for the simple example training application.
//!
//! The application talks RPC in both directions: it calls back into a
//! listener hosted here to report state and completion, and exposes `load`,
//! `blob` and `closeApplication` for the gateway to call.

use std::sync::Arc;

use interop_common::{
    ConfigurationError, InteropCore, InteropError, InteropInput, InteropInterface, InteropResult,
    MessageSink, PluginContext, PluginFactory, Registration, RpcInput, Teardown, WindowControl,
};
use message_abi::{
    now_millis, AppState, Message, MessageType, Payload, SimanKind, StopFreeze,
    TrainingApplication,
};
use runtime_native::{TcpRpcClient, TcpRpcServer};
use serde_json::Value;
use tracing::{info, warn};
use transport_fabric::{
    shutdown_process, ExternalProcess, LaunchSpec, RpcClient, RpcHandler, RpcServer,
};

pub const IMPLEMENTATION: &str = "interop.simple.SimpleExampleInterface";

/// Methods the application calls on us.
pub const STATE_METHOD: &str = "handleTrainingApplicationMessage";
pub const FINISHED_METHOD: &str = "handleTrainingApplicationFinished";

/// Methods we call on the application.
pub const LOAD_METHOD: &str = "load";
pub const BLOB_METHOD: &str = "blob";
pub const CLOSE_METHOD: &str = "closeApplication";

#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleExampleFactory;

impl PluginFactory for SimpleExampleFactory {
    fn implementation(&self) -> &str {
        IMPLEMENTATION
    }

    fn create(&self, name: &str, ctx: PluginContext) -> Box<dyn InteropInterface> {
        Box::new(SimpleExampleInterface::new(name, ctx))
    }
}

pub struct SimpleExampleInterface {
    registration: Registration,
    core: InteropCore,
    ctx: PluginContext,
    input: Option<RpcInput>,
    server: Option<TcpRpcServer>,
    client: Option<TcpRpcClient>,
    process: Option<Box<dyn ExternalProcess>>,
    loaded: Option<String>,
}

impl SimpleExampleInterface {
    pub fn new(name: &str, ctx: PluginContext) -> Self {
        Self {
            registration: Registration::builder(IMPLEMENTATION, name)
                .supports([MessageType::Siman, MessageType::DisplayFeedback])
                .produces([MessageType::AppState, MessageType::StopFreeze])
                .requires(TrainingApplication::SimpleExample)
                .build(),
            core: InteropCore::new(name),
            ctx,
            input: None,
            server: None,
            client: None,
            process: None,
            loaded: None,
        }
    }

    /// Listener address while enabled.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.as_ref().and_then(|server| server.local_addr())
    }

    pub fn loaded_scenario(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    fn call(&self, method: &str, params: Vec<Value>) -> InteropResult<Value> {
        let client = self.client.as_ref().ok_or_else(|| {
            InteropError::dispatch(self.name(), format!("cannot call `{method}` while disabled"))
        })?;
        Ok(client.call(method, params).into_result(method)?)
    }

    fn blob(&self, text: &str) -> InteropResult<()> {
        self.call(BLOB_METHOD, vec![Value::from(text)]).map(drop)
    }

    fn open(&mut self, input: &RpcInput) -> InteropResult<()> {
        if let Some(previous) = self.process.as_mut() {
            if previous.try_exit()?.is_none() {
                return Err(InteropError::dispatch(
                    self.core.name(),
                    "previous launch has not exited; the application is in an unknown state",
                ));
            }
            self.process = None;
        }

        if let Some(program) = &input.program {
            let spec = LaunchSpec::new(program).args(input.args.iter().cloned());
            let mut process = self.ctx.launcher.launch(&spec)?;
            if let Some(marker) = &input.ready_marker {
                if let Err(err) = process.wait_for_line(marker, input.ready_timeout()) {
                    if let Err(stop) = shutdown_process(process.as_mut()) {
                        warn!(
                            interface = %self.core.name(),
                            error = %stop,
                            "could not stop unready application"
                        );
                    }
                    return Err(err.into());
                }
            }
            self.process = Some(process);
        }

        let mut server = TcpRpcServer::new(input.local_port);
        let handler = Arc::new(CallbackHandler {
            application: TrainingApplication::SimpleExample,
            sink: self.ctx.sink.clone(),
        });
        let opened = server.start(handler).and_then(|()| {
            TcpRpcClient::new(
                &input.external_host,
                input.external_port,
                input.call_timeout(),
            )
        });
        match opened {
            Ok(client) => {
                info!(
                    interface = %self.core.name(),
                    local = ?server.local_addr(),
                    peer = %client.endpoint(),
                    "listening for application callbacks"
                );
                self.server = Some(server);
                self.client = Some(client);
                Ok(())
            }
            Err(err) => {
                if let Err(stop) = server.stop() {
                    warn!(
                        interface = %self.core.name(),
                        error = %stop,
                        "could not stop callback server"
                    );
                }
                if let Some(mut process) = self.process.take() {
                    if let Err(stop) = shutdown_process(process.as_mut()) {
                        warn!(
                            interface = %self.core.name(),
                            error = %stop,
                            "could not stop application after failed connect"
                        );
                    }
                }
                Err(err.into())
            }
        }
    }

    fn close(&mut self) -> InteropResult<()> {
        let mut teardown = Teardown::new(self.core.name());
        let still_running = match self.process.as_mut() {
            Some(process) => teardown
                .step("check application exit", process.try_exit())
                .map_or(true, |exit| exit.is_none()),
            None => false,
        };
        if still_running && self.client.is_some() {
            warn!(
                interface = %self.core.name(),
                "application still running at disable; asking it to close"
            );
            teardown.step(CLOSE_METHOD, self.call(CLOSE_METHOD, Vec::new()));
        }
        if let Some(mut process) = self.process.take() {
            teardown.step("stop application", shutdown_process(process.as_mut()));
        }
        if let Some(mut server) = self.server.take() {
            teardown.step("stop listener", server.stop());
        }
        self.client = None;
        teardown.finish()
    }
}

impl InteropInterface for SimpleExampleInterface {
    fn registration(&self) -> &Registration {
        &self.registration
    }

    fn core(&self) -> &InteropCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut InteropCore {
        &mut self.core
    }

    fn configure(&mut self, input: &InteropInput) -> InteropResult<()> {
        let rpc = input.as_rpc()?;
        if rpc.ready_marker.is_some() && rpc.program.is_none() {
            return Err(ConfigurationError::MissingField { field: "program" }.into());
        }
        self.core.configured()?;
        self.input = Some(rpc.clone());
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> InteropResult<()> {
        if !self.core.needs_transition(enabled)? {
            return Ok(());
        }
        if enabled {
            let input = self
                .input
                .clone()
                .ok_or_else(|| InteropError::dispatch(self.core.name(), "no input configured"))?;
            self.open(&input)?;
            self.core.enabled();
            Ok(())
        } else {
            let result = self.close();
            self.core.disabled();
            result
        }
    }

    fn load_scenario(&mut self, scenario: Option<&str>) -> InteropResult<()> {
        match scenario {
            Some(id) => {
                self.call(LOAD_METHOD, vec![Value::from(id)]).map_err(|err| {
                    InteropError::scenario(self.name(), format!("failed to load `{id}`: {err}"))
                })?;
                info!(interface = %self.name(), scenario = id, "scenario loaded");
                self.loaded = Some(id.to_string());
            }
            None => {
                self.loaded = None;
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) -> InteropResult<()> {
        self.close()
    }

    fn on_message(&mut self, message: &Message) -> InteropResult<bool> {
        match message.payload() {
            Payload::DisplayFeedback(feedback) => {
                self.blob(&format!(
                    "Display Feedback received with feedback of \"{}\"",
                    feedback.text
                ))?;
                Ok(false)
            }
            _ => Err(InteropError::unsupported(
                self.name(),
                message.message_type(),
            )),
        }
    }

    fn on_directive(&mut self, kind: SimanKind) -> InteropResult<()> {
        self.blob(&format!("{kind} message received"))
    }

    fn stop_application(&mut self) -> InteropResult<()> {
        self.call(CLOSE_METHOD, Vec::new()).map(drop)
    }

    fn restart_application(&mut self) -> InteropResult<()> {
        self.blob("Restart message received")
    }

    fn window(&self) -> Option<&dyn WindowControl> {
        Some(self.ctx.window.as_ref())
    }
}

/// Turns application callbacks into produced messages.
struct CallbackHandler {
    application: TrainingApplication,
    sink: MessageSink,
}

impl RpcHandler for CallbackHandler {
    fn handle(&self, method: &str, params: &[Value]) -> Result<Value, String> {
        let message = match method {
            STATE_METHOD => {
                let content = params
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| format!("`{method}` expects one string parameter"))?;
                Message::new(AppState {
                    application: self.application.to_string(),
                    content: content.to_string(),
                })
            }
            FINISHED_METHOD => Message::new(StopFreeze {
                real_world_time: now_millis(),
                reason: "training application finished".into(),
                frozen_behavior: 0,
                request_id: 0,
            }),
            other => return Err(format!("unknown method `{other}`")),
        };
        self.sink.deliver(message);
        Ok(Value::from(0))
    }
}
