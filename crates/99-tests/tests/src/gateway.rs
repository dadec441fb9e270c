//! Manager-level lifecycle guarantees with real plugins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hub::{HubError, InteropManager, Reply};
use interop_common::{
    InteropError, InteropInput, InteropInterface, InteropCore, InteropResult, InteropState,
    PluginContext, PluginFactory, Registration,
};
use interop_simple::CLOSE_METHOD;
use interop_triage::TriageSimFactory;
use message_abi::{InteractionMode, Message, Payload, SimanKind};
use testdata::{display_feedback, triage, ScriptedBehavior, ScriptedLauncher};

use crate::support::{simple_entry, triage_entry, FakeApplication, Simulator};

const STUCK_IMPL: &str = "interop.test.StuckTriageInterface";

/// Triage interface whose disable always fails, counting cleanups.
struct StuckFactory {
    cleanups: Arc<AtomicUsize>,
}

impl PluginFactory for StuckFactory {
    fn implementation(&self) -> &str {
        STUCK_IMPL
    }

    fn create(&self, name: &str, ctx: PluginContext) -> Box<dyn InteropInterface> {
        Box::new(Stuck {
            inner: TriageSimFactory.create(name, ctx),
            cleanups: Arc::clone(&self.cleanups),
        })
    }
}

struct Stuck {
    inner: Box<dyn InteropInterface>,
    cleanups: Arc<AtomicUsize>,
}

impl InteropInterface for Stuck {
    fn registration(&self) -> &Registration {
        self.inner.registration()
    }

    fn core(&self) -> &InteropCore {
        self.inner.core()
    }

    fn core_mut(&mut self) -> &mut InteropCore {
        self.inner.core_mut()
    }

    fn configure(&mut self, input: &InteropInput) -> InteropResult<()> {
        self.inner.configure(input)
    }

    fn set_enabled(&mut self, enabled: bool) -> InteropResult<()> {
        if enabled {
            self.inner.set_enabled(true)
        } else {
            Err(InteropError::dispatch(self.name(), "simulator is not responding"))
        }
    }

    fn load_scenario(&mut self, scenario: Option<&str>) -> InteropResult<()> {
        self.inner.load_scenario(scenario)
    }

    fn cleanup(&mut self) -> InteropResult<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        self.inner.cleanup()
    }
}

#[test]
fn second_interface_failing_to_enable_rolls_back_the_first() {
    let (app, _server, app_port) = FakeApplication::serve();
    let sim = Simulator::new();
    let config = [
        simple_entry(1, "First", app_port, "READY"),
        simple_entry(2, "Second", app_port, "SIMULATION ONLINE"),
        triage_entry(3, "Third", interop_triage::IMPLEMENTATION, &sim),
    ]
    .concat();
    let launcher = ScriptedLauncher::new(ScriptedBehavior::Ready {
        line: "app READY".into(),
    });
    let mut manager = InteropManager::builder()
        .with_default_plugins()
        .launcher(Arc::new(launcher.clone()))
        .config_str(&config)
        .unwrap()
        .build()
        .unwrap();

    let err = manager
        .connect_interops(&[1, 2, 3], InteractionMode::Learner)
        .unwrap_err();

    assert!(matches!(err, HubError::Connect(_)));
    let failures = err.failures();
    assert_eq!(failures.len(), 1, "{err}");
    assert_eq!(failures[0].interface, "Second");
    assert!(err.to_string().contains("SIMULATION ONLINE"), "{err}");

    assert_eq!(manager.interface(1).unwrap().state(), InteropState::Disabled);
    assert_eq!(manager.interface(2).unwrap().state(), InteropState::Configured);
    assert_eq!(manager.interface(3).unwrap().state(), InteropState::Unconfigured);

    // The first application was told to close and its process reaped; the
    // second never became ready and was reaped on the spot.
    assert_eq!(app.methods(), [CLOSE_METHOD]);
    let launches = launcher.launches();
    assert_eq!(launches.len(), 2);
    assert!(launches.iter().all(|launch| launch.terminate_calls == 1));
}

#[test]
fn teardown_completes_when_the_second_interface_cannot_disable() {
    let sims = [Simulator::new(), Simulator::new(), Simulator::new()];
    let config = [
        triage_entry(1, "First", interop_triage::IMPLEMENTATION, &sims[0]),
        triage_entry(2, "Stuck", STUCK_IMPL, &sims[1]),
        triage_entry(3, "Third", interop_triage::IMPLEMENTATION, &sims[2]),
    ]
    .concat();
    let cleanups = Arc::new(AtomicUsize::new(0));
    let mut manager = InteropManager::builder()
        .with_default_plugins()
        .plugin(StuckFactory {
            cleanups: Arc::clone(&cleanups),
        })
        .launcher(Arc::new(ScriptedLauncher::ready("")))
        .config_str(&config)
        .unwrap()
        .build()
        .unwrap();
    manager
        .connect_interops(&[1, 2, 3], InteractionMode::Author)
        .unwrap();

    let err = manager.disconnect_current_interops().unwrap_err();

    assert!(matches!(err, HubError::Disconnect(_)));
    assert_eq!(err.failures().len(), 1, "{err}");
    assert_eq!(err.failures()[0].interface, "Stuck");
    assert_eq!(
        err.failures()[0].reason,
        "disable: Stuck: simulator is not responding"
    );

    // Every simulator was told to stop before anything was disabled.
    for sim in &sims {
        match sim.next().payload() {
            Payload::Siman(siman) => assert_eq!(siman.kind, SimanKind::Stop),
            other => panic!("expected stop, got {other:?}"),
        }
    }
    assert_eq!(manager.interface(1).unwrap().state(), InteropState::Disabled);
    assert_eq!(manager.interface(3).unwrap().state(), InteropState::Disabled);
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

#[test]
fn unsupported_types_are_refused_without_panicking() {
    let sim = Simulator::new();
    let config = triage_entry(1, "Triage", interop_triage::IMPLEMENTATION, &sim);
    let mut manager = InteropManager::builder()
        .with_default_plugins()
        .launcher(Arc::new(ScriptedLauncher::ready("")))
        .config_str(&config)
        .unwrap()
        .build()
        .unwrap();
    manager
        .connect_interops(&[1], InteractionMode::Learner)
        .unwrap();

    let report = manager.dispatch(&Message::new(triage(None)));
    assert_eq!(
        report.reply,
        Some(Reply::Nack(
            "no interop interfaces can handle Triage messages".into()
        ))
    );

    // Optional types nobody handles go unanswered.
    let report = manager.dispatch(&Message::new(display_feedback("ignored")));
    assert_eq!(report.reply, None);

    manager.disconnect_current_interops().unwrap();
}
