use std::sync::Arc;

use hub::{InteropManager, Reply};
use message_abi::{InteractionMode, Message, Payload};
use testdata::{environment_fog, scenario, scenario_message, timer_batch, ScriptedLauncher};

use crate::support::{triage_entry, Simulator, WAIT};

fn connected(sim: &Simulator) -> InteropManager {
    let config = triage_entry(5, "Triage Simulator", interop_triage::IMPLEMENTATION, sim);
    let mut manager = InteropManager::builder()
        .with_default_plugins()
        .launcher(Arc::new(ScriptedLauncher::ready("")))
        .config_str(&config)
        .unwrap()
        .build()
        .unwrap();
    manager
        .connect_interops(&[5], InteractionMode::Author)
        .unwrap();
    manager
}

#[test]
fn environment_control_reaches_the_simulator_intact() {
    let sim = Simulator::new();
    let mut manager = connected(&sim);

    let fog = Message::new(environment_fog()).with_session(11).at(1234);
    let report = manager.dispatch(&fog);
    assert_eq!(report.reply, Some(Reply::Ack));
    assert_eq!(sim.next(), fog);

    manager.disconnect_current_interops().unwrap();
}

#[test]
fn reported_scenario_answers_manager_queries() {
    let sim = Simulator::new();
    let mut manager = connected(&sim);

    sim.report(&scenario_message());
    let produced = manager.produced().recv_timeout(WAIT).unwrap();
    assert_eq!(produced, scenario_message());

    let metadata = manager.current_scenario_metadata().unwrap().unwrap();
    assert_eq!(metadata.id, "42");
    assert_eq!(metadata.title, "Convoy ambush");
    assert_eq!(manager.selectable_objects().unwrap().unwrap().len(), 7);
    assert_eq!(manager.export_scenario().unwrap().unwrap(), scenario());

    manager.select_object("200").unwrap();
    match sim.next().payload() {
        Payload::TrainingEvent(event) => {
            assert_eq!(event.name, interop_triage::OBJECT_SELECTED_EVENT);
            assert_eq!(event.attributes["objectId"], "200");
            assert_eq!(event.attributes["name"], "Burning vehicle");
        }
        other => panic!("expected training event, got {other:?}"),
    }

    let err = manager.select_object("nope").unwrap_err();
    assert!(err.to_string().contains("`nope`"), "{err}");

    manager.disconnect_current_interops().unwrap();
    assert_eq!(manager.current_scenario_metadata().unwrap(), None);
}

#[test]
fn timer_batches_flow_back_in_order() {
    let sim = Simulator::new();
    let manager = connected(&sim);

    let first = Message::new(timer_batch()).with_scenario_event(1);
    let second = Message::new(timer_batch()).with_scenario_event(2);
    sim.report(&first);
    sim.report(&second);

    assert_eq!(manager.produced().recv_timeout(WAIT).unwrap(), first);
    assert_eq!(manager.produced().recv_timeout(WAIT).unwrap(), second);
}
