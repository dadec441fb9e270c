use std::sync::Arc;
use std::time::Duration;

use hub::{InteropManager, Reply};
use interop_simple::{BLOB_METHOD, CLOSE_METHOD, LOAD_METHOD, STATE_METHOD};
use message_abi::{InteractionMode, Message, Payload, Siman, SimanKind};
use runtime_native::TcpRpcClient;
use serde_json::json;
use testdata::{display_feedback, free_tcp_port, siman_load, ScriptedLauncher};
use transport_fabric::RpcClient;

use crate::support::{FakeApplication, WAIT};

#[test]
fn simple_example_round_trip_through_the_manager() {
    let (app, _server, app_port) = FakeApplication::serve();
    let local_port = free_tcp_port();
    let config = format!(
        r#"
[[interop]]
ref_id = 1
name = "Simple Example"
implementation = "interop.simple.SimpleExampleInterface"
training_application = "simple-example"

[interop.input]
kind = "rpc"
local_port = {local_port}
external_port = {app_port}
program = "simple-example-app"
ready_marker = "READY"
"#
    );
    let launcher = ScriptedLauncher::ready("simple example READY");
    let mut manager = InteropManager::builder()
        .with_default_plugins()
        .launcher(Arc::new(launcher.clone()))
        .config_str(&config)
        .unwrap()
        .build()
        .unwrap();
    manager
        .connect_interops(&[1], InteractionMode::Learner)
        .unwrap();

    let load = manager.dispatch(&Message::new(siman_load("intro")));
    assert_eq!(load.reply, Some(Reply::Ack), "{load:?}");
    let start = manager.dispatch(&Message::new(Siman::directive(SimanKind::Start)));
    assert_eq!(start.handled_by, ["Simple Example"]);
    manager.dispatch(&Message::new(display_feedback("steady hands")));

    let calls = app.calls();
    assert_eq!(calls[0], (LOAD_METHOD.to_string(), vec![json!("intro")]));
    assert_eq!(
        calls[1],
        (BLOB_METHOD.to_string(), vec![json!("Start message received")])
    );
    assert_eq!(
        calls[2],
        (
            BLOB_METHOD.to_string(),
            vec![json!("Display Feedback received with feedback of \"steady hands\"")]
        )
    );

    // The application reports back through the listener the interface hosts.
    let callback =
        TcpRpcClient::new("127.0.0.1", local_port, Duration::from_secs(2)).unwrap();
    callback
        .call(STATE_METHOD, vec![json!("triage station 2")])
        .into_result(STATE_METHOD)
        .unwrap();
    let produced = manager.produced().recv_timeout(WAIT).unwrap();
    match produced.payload() {
        Payload::AppState(state) => assert_eq!(state.content, "triage station 2"),
        other => panic!("expected app state, got {other:?}"),
    }

    assert_eq!(manager.scenarios().unwrap(), None);

    manager.disconnect_current_interops().unwrap();
    assert_eq!(app.methods().last().map(String::as_str), Some(CLOSE_METHOD));
    assert_eq!(launcher.launches()[0].terminate_calls, 1);
    assert!(!manager.interface(1).unwrap().is_enabled());
}

#[test]
fn failed_load_is_reported_as_a_nack() {
    let (_app, _server, app_port) = FakeApplication::serve();
    let config = crate::support::simple_entry(1, "Simple Example", app_port, "READY");
    let mut manager = InteropManager::builder()
        .with_default_plugins()
        .launcher(Arc::new(ScriptedLauncher::ready("READY")))
        .config_str(&config)
        .unwrap()
        .build()
        .unwrap();
    manager
        .connect_interops(&[1], InteractionMode::Learner)
        .unwrap();

    let report = manager.dispatch(&Message::new(siman_load("missing")));
    match report.reply {
        Some(Reply::Nack(reason)) => {
            assert!(reason.contains("failed to load `missing`"), "{reason}");
            assert!(reason.contains("no such scenario"), "{reason}");
        }
        other => panic!("expected nack, got {other:?}"),
    }
    manager.shutdown();
}
