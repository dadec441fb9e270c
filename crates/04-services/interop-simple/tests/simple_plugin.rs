use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use interop_common::{
    InteropError, InteropInput, InteropInterface, InteropState, MessageSink, PacketInput,
    PluginContext, RpcInput,
};
use interop_simple::{
    SimpleExampleInterface, BLOB_METHOD, CLOSE_METHOD, FINISHED_METHOD, LOAD_METHOD,
    STATE_METHOD,
};
use message_abi::{LoadArgs, Message, Payload, Siman, SimanKind};
use parking_lot::Mutex;
use runtime_native::{TcpRpcClient, TcpRpcServer};
use serde_json::{json, Value};
use testdata::{display_feedback, ScriptedBehavior, ScriptedLauncher, SIMPLE_IMPL};
use transport_fabric::{RpcClient, RpcHandler, RpcServer};

/// Stand-in for the external application's RPC endpoint.
#[derive(Default)]
struct FakeApplication {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeApplication {
    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
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

struct Harness {
    app: Arc<FakeApplication>,
    _app_server: TcpRpcServer,
    launcher: ScriptedLauncher,
    produced: Receiver<Message>,
    interface: SimpleExampleInterface,
    input: RpcInput,
}

fn harness(behavior: ScriptedBehavior) -> Harness {
    let app = Arc::new(FakeApplication::default());
    let mut app_server = TcpRpcServer::new(0);
    app_server.start(app.clone()).unwrap();
    let app_port = app_server.local_addr().unwrap().port();

    let launcher = ScriptedLauncher::new(behavior);
    let (tx, produced) = unbounded();
    let ctx = PluginContext::new(Arc::new(launcher.clone()), MessageSink::new(tx));
    let interface = SimpleExampleInterface::new("Simple Example", ctx);

    let mut input = RpcInput::new(0, "127.0.0.1", app_port);
    input.program = Some("simple-example-app".into());
    input.ready_marker = Some("READY".into());
    input.ready_timeout_ms = 200;

    Harness {
        app,
        _app_server: app_server,
        launcher,
        produced,
        interface,
        input,
    }
}

fn methods(app: &FakeApplication) -> Vec<String> {
    app.calls().into_iter().map(|(method, _)| method).collect()
}

#[test]
fn full_lifecycle_against_fake_application() {
    let mut h = harness(ScriptedBehavior::Ready {
        line: "app READY".into(),
    });
    h.interface
        .configure(&InteropInput::Rpc(h.input.clone()))
        .unwrap();
    h.interface.set_enabled(true).unwrap();
    assert_eq!(h.interface.state(), InteropState::Enabled);
    assert_eq!(h.launcher.launches().len(), 1);

    let load = Siman::load().with_load_args(SIMPLE_IMPL, LoadArgs::new().with("scenario", "intro"));
    let outcome = h.interface.handle_message(&Message::new(load));
    assert!(outcome.is_handled(), "{:?}", outcome.error);
    assert_eq!(h.interface.loaded_scenario(), Some("intro"));

    let start = h
        .interface
        .handle_message(&Message::new(Siman::directive(SimanKind::Start)));
    assert!(start.is_handled());
    let feedback = h.interface.handle_message(&Message::new(display_feedback("nice work")));
    assert!(feedback.is_handled());

    let calls = h.app.calls();
    assert_eq!(calls[0], (LOAD_METHOD.to_string(), vec![json!("intro")]));
    assert_eq!(
        calls[1],
        (BLOB_METHOD.to_string(), vec![json!("Start message received")])
    );
    assert_eq!(
        calls[2].1,
        vec![json!("Display Feedback received with feedback of \"nice work\"")]
    );

    // The application calls back into the listener we host.
    let local = h.interface.local_addr().unwrap();
    let callback = TcpRpcClient::new("127.0.0.1", local.port(), Duration::from_secs(2)).unwrap();
    assert!(callback.call(STATE_METHOD, vec![json!("lesson 1 open")]).is_ok());
    assert!(callback.call(FINISHED_METHOD, vec![]).is_ok());
    assert!(!callback.call("bogus", vec![]).is_ok());

    let first = h.produced.recv_timeout(Duration::from_secs(2)).unwrap();
    match first.payload() {
        Payload::AppState(state) => assert_eq!(state.content, "lesson 1 open"),
        other => panic!("expected app state, got {other:?}"),
    }
    let second = h.produced.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(second.payload(), Payload::StopFreeze(_)));

    h.interface.set_enabled(false).unwrap();
    assert_eq!(h.interface.state(), InteropState::Disabled);
    assert!(h.interface.local_addr().is_none());
    assert_eq!(methods(&h.app).last().map(String::as_str), Some(CLOSE_METHOD));
    let launches = h.launcher.launches();
    assert_eq!(launches[0].terminate_calls, 1);

    // Disabling twice changes nothing.
    h.interface.set_enabled(false).unwrap();
    assert_eq!(h.launcher.launches()[0].terminate_calls, 1);
}

#[test]
fn exited_application_is_not_terminated_again() {
    let mut h = harness(ScriptedBehavior::ExitsImmediately {
        line: "READY".into(),
        code: 0,
    });
    h.interface
        .configure(&InteropInput::Rpc(h.input.clone()))
        .unwrap();
    h.interface.set_enabled(true).unwrap();
    h.interface.set_enabled(false).unwrap();

    assert_eq!(h.launcher.launches()[0].terminate_calls, 0);
    assert!(!methods(&h.app).contains(&CLOSE_METHOD.to_string()));
}

#[test]
fn unready_application_fails_enable_and_is_stopped() {
    let mut h = harness(ScriptedBehavior::NeverReady);
    h.interface
        .configure(&InteropInput::Rpc(h.input.clone()))
        .unwrap();
    let err = h.interface.set_enabled(true).unwrap_err();
    assert!(err.to_string().contains("READY"), "{err}");
    assert_eq!(h.interface.state(), InteropState::Configured);
    assert_eq!(h.launcher.launches()[0].terminate_calls, 1);
}

#[test]
fn busy_callback_port_fails_enable_and_stops_application() {
    let mut h = harness(ScriptedBehavior::Ready {
        line: "READY".into(),
    });
    let busy = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    h.input.local_port = busy.local_addr().unwrap().port();
    h.interface
        .configure(&InteropInput::Rpc(h.input.clone()))
        .unwrap();

    let err = h.interface.set_enabled(true).unwrap_err();
    assert!(err.to_string().contains("could not connect"), "{err}");
    assert_eq!(h.interface.state(), InteropState::Configured);
    let launches = h.launcher.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].terminate_calls, 1);
}

#[test]
fn load_failure_is_reported_in_outcome() {
    let mut h = harness(ScriptedBehavior::Ready {
        line: "READY".into(),
    });
    h.interface
        .configure(&InteropInput::Rpc(h.input.clone()))
        .unwrap();
    h.interface.set_enabled(true).unwrap();

    let load =
        Siman::load().with_load_args(SIMPLE_IMPL, LoadArgs::new().with("scenario", "missing"));
    let outcome = h.interface.handle_message(&Message::new(load));
    let text = outcome.error.unwrap().to_string();
    assert!(text.contains("failed to load `missing`"), "{text}");
    assert!(text.contains("no such scenario"), "{text}");
    assert_eq!(h.interface.loaded_scenario(), None);
    h.interface.cleanup().unwrap();
}

#[test]
fn packet_input_is_rejected() {
    let mut h = harness(ScriptedBehavior::NeverReady);
    let err = h
        .interface
        .configure(&InteropInput::Packet(PacketInput::new(0, "127.0.0.1", 1)))
        .unwrap_err();
    assert!(matches!(err, InteropError::Configuration(_)));
    assert_eq!(err.to_string(), "expected `rpc` input, got `packet`");
    assert_eq!(h.interface.state(), InteropState::Unconfigured);
}
