use std::collections::BTreeSet;
use std::sync::Arc;

use hub::{HubError, InteropConfig, InteropManager, Reply};
use interop_common::{
    InteropError, InteropInput, InteropInterface, InteropResult, InteropCore, PacketInput,
    PluginContext, PluginFactory, Registration,
};
use message_abi::{
    InteractionMode, Message, MessageType, ScenarioSummary, SimanKind, TrainingApplication,
};
use parking_lot::Mutex;
use testdata::{display_feedback, lesson_completed, siman, stop_freeze, triage, ScriptedLauncher};

const FAKE_IMPL: &str = "interop.fake.FakeInterface";

/// Which steps fail, per interface name.
#[derive(Default)]
struct Faults {
    enable: BTreeSet<String>,
    disable: BTreeSet<String>,
    handle: BTreeSet<String>,
    replies: BTreeSet<String>,
    scenarios: BTreeSet<String>,
    query_error: BTreeSet<String>,
}

#[derive(Clone, Default)]
struct Shared {
    faults: Arc<Mutex<Faults>>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Shared {
    fn record(&self, entry: String) {
        self.journal.lock().push(entry);
    }

    fn journal(&self) -> Vec<String> {
        std::mem::take(&mut *self.journal.lock())
    }
}

struct FakeFactory(Shared);

impl PluginFactory for FakeFactory {
    fn implementation(&self) -> &str {
        FAKE_IMPL
    }

    fn create(&self, name: &str, _ctx: PluginContext) -> Box<dyn InteropInterface> {
        Box::new(Fake {
            registration: Registration::builder(FAKE_IMPL, "Fake")
                .supports([MessageType::Siman, MessageType::DisplayFeedback])
                .requires(TrainingApplication::SimpleExample)
                .build(),
            core: InteropCore::new(name),
            shared: self.0.clone(),
        })
    }
}

struct Fake {
    registration: Registration,
    core: InteropCore,
    shared: Shared,
}

impl Fake {
    fn faulty(&self, pick: impl Fn(&Faults) -> &BTreeSet<String>) -> bool {
        pick(&*self.shared.faults.lock()).contains(self.core.name())
    }
}

impl InteropInterface for Fake {
    fn registration(&self) -> &Registration {
        &self.registration
    }

    fn core(&self) -> &InteropCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut InteropCore {
        &mut self.core
    }

    fn configure(&mut self, _input: &InteropInput) -> InteropResult<()> {
        self.shared.record(format!("configure {}", self.core.name()));
        self.core.configured()
    }

    fn set_enabled(&mut self, enabled: bool) -> InteropResult<()> {
        if !self.core.needs_transition(enabled)? {
            return Ok(());
        }
        let verb = if enabled { "enable" } else { "disable" };
        self.shared.record(format!("{verb} {}", self.core.name()));
        let failing = if enabled {
            self.faulty(|faults| &faults.enable)
        } else {
            self.faulty(|faults| &faults.disable)
        };
        if failing {
            return Err(InteropError::dispatch(self.core.name(), format!("{verb} refused")));
        }
        if enabled {
            self.core.enabled();
        } else {
            self.core.disabled();
        }
        Ok(())
    }

    fn load_scenario(&mut self, scenario: Option<&str>) -> InteropResult<()> {
        self.shared
            .record(format!("load {} {scenario:?}", self.core.name()));
        Ok(())
    }

    fn cleanup(&mut self) -> InteropResult<()> {
        self.shared.record(format!("cleanup {}", self.core.name()));
        Ok(())
    }

    fn on_message(&mut self, message: &Message) -> InteropResult<bool> {
        self.shared
            .record(format!("{} {}", message.message_type(), self.core.name()));
        if self.faulty(|faults| &faults.handle) {
            return Err(InteropError::dispatch(self.core.name(), "application rejected it"));
        }
        Ok(self.faulty(|faults| &faults.replies))
    }

    fn scenarios(&self) -> InteropResult<Option<Vec<ScenarioSummary>>> {
        if self.faulty(|faults| &faults.query_error) {
            return Err(InteropError::dispatch(self.core.name(), "listing failed"));
        }
        Ok(self.faulty(|faults| &faults.scenarios).then(|| {
            vec![ScenarioSummary {
                id: self.core.name().to_string(),
                title: "Fake scenario".to_string(),
            }]
        }))
    }
}

fn config(ref_id: u32, name: &str) -> InteropConfig {
    InteropConfig {
        ref_id,
        name: name.to_string(),
        implementation: FAKE_IMPL.to_string(),
        training_application: TrainingApplication::SimpleExample,
        available: true,
        input: InteropInput::Packet(PacketInput::new(0, "127.0.0.1", 1)),
    }
}

fn manager(names: &[&str]) -> (InteropManager, Shared) {
    let shared = Shared::default();
    let configs = names
        .iter()
        .enumerate()
        .map(|(idx, name)| config(idx as u32 + 1, name));
    let manager = InteropManager::builder()
        .plugin(FakeFactory(shared.clone()))
        .launcher(Arc::new(ScriptedLauncher::ready("ready")))
        .configs(configs)
        .build()
        .unwrap();
    (manager, shared)
}

#[test]
fn failed_enable_rolls_back_earlier_interfaces() {
    let (mut manager, shared) = manager(&["one", "two", "three"]);
    shared.faults.lock().enable.insert("two".into());

    let err = manager
        .connect_interops(&[1, 2, 3], InteractionMode::Learner)
        .unwrap_err();

    assert!(matches!(err, HubError::Connect(_)));
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].interface, "two");
    assert!(err.to_string().contains("two: two: enable refused"));
    assert_eq!(
        shared.journal(),
        ["configure one", "enable one", "configure two", "enable two", "disable one"]
    );
    for id in [1, 2, 3] {
        assert!(!manager.interface(id).unwrap().is_enabled());
    }
}

#[test]
fn rollback_failures_are_reported_alongside_the_cause() {
    let (mut manager, shared) = manager(&["one", "two"]);
    {
        let mut faults = shared.faults.lock();
        faults.enable.insert("two".into());
        faults.disable.insert("one".into());
    }

    let err = manager
        .connect_interops(&[1, 2], InteractionMode::Learner)
        .unwrap_err();

    let named: Vec<_> = err.failures().iter().map(|f| f.interface.as_str()).collect();
    assert_eq!(named, ["two", "one"]);
    assert!(err.failures()[1].reason.starts_with("rollback: "));
}

#[test]
fn unknown_ref_id_fails_before_touching_anything() {
    let (mut manager, shared) = manager(&["one"]);
    let err = manager
        .connect_interops(&[1, 9], InteractionMode::Author)
        .unwrap_err();
    assert!(matches!(err, HubError::UnknownInterop(9)));
    assert!(shared.journal().is_empty());
}

#[test]
fn connecting_twice_only_updates_the_mode() {
    let (mut manager, shared) = manager(&["one"]);
    manager.connect_interops(&[1], InteractionMode::Learner).unwrap();
    shared.journal();
    manager.connect_interops(&[1], InteractionMode::Author).unwrap();
    assert!(shared.journal().is_empty());
    assert_eq!(manager.interface(1).unwrap().core().mode(), InteractionMode::Author);
}

#[test]
fn disconnect_runs_every_stage_despite_failures() {
    let (mut manager, shared) = manager(&["one", "two", "three"]);
    manager
        .connect_interops(&[1, 2, 3], InteractionMode::Learner)
        .unwrap();
    shared.journal();
    shared.faults.lock().disable.insert("two".into());

    let err = manager.disconnect_current_interops().unwrap_err();

    assert!(matches!(err, HubError::Disconnect(_)));
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].interface, "two");
    assert!(err.failures()[0].reason.starts_with("disable: "));
    assert_eq!(
        shared.journal(),
        [
            "load one None",
            "load two None",
            "load three None",
            "disable one",
            "disable two",
            "disable three",
            "cleanup one",
            "cleanup two",
            "cleanup three",
        ]
    );
}

#[test]
fn disconnect_skips_interfaces_that_were_never_enabled() {
    let (mut manager, shared) = manager(&["one", "two"]);
    manager.connect_interops(&[2], InteractionMode::Learner).unwrap();
    shared.journal();
    manager.disconnect_current_interops().unwrap();
    assert_eq!(shared.journal(), ["load two None", "disable two", "cleanup two"]);
}

#[test]
fn dispatch_acks_when_nobody_replies() {
    let (mut manager, shared) = manager(&["one", "two"]);
    manager.connect_interops(&[1, 2], InteractionMode::Learner).unwrap();
    shared.journal();

    let report = manager.dispatch(&Message::new(display_feedback("well done")));

    assert_eq!(report.reply, Some(Reply::Ack));
    assert_eq!(report.handled_by, ["one", "two"]);
    assert_eq!(shared.journal(), ["DisplayFeedback one", "DisplayFeedback two"]);
}

#[test]
fn dispatch_leaves_the_reply_to_an_interface_that_answered() {
    let (mut manager, shared) = manager(&["one"]);
    manager.connect_interops(&[1], InteractionMode::Learner).unwrap();
    shared.faults.lock().replies.insert("one".into());
    let report = manager.dispatch(&Message::new(display_feedback("hint")));
    assert_eq!(report.reply, None);
    assert_eq!(report.handled_by, ["one"]);
}

#[test]
fn dispatch_attempts_everyone_then_nacks_with_every_error() {
    let (mut manager, shared) = manager(&["one", "two", "three"]);
    manager
        .connect_interops(&[1, 2, 3], InteractionMode::Learner)
        .unwrap();
    {
        let mut faults = shared.faults.lock();
        faults.handle.insert("one".into());
        faults.handle.insert("three".into());
    }

    let report = manager.dispatch(&Message::new(display_feedback("hint")));

    assert_eq!(
        report.reply,
        Some(Reply::Nack(
            "one: application rejected it\nthree: application rejected it".into()
        ))
    );
    assert_eq!(report.handled_by, ["two"]);
}

#[test]
fn unsupported_types_are_nacked_and_optional_ones_ignored() {
    let (mut manager, _shared) = manager(&["one"]);
    manager.connect_interops(&[1], InteractionMode::Learner).unwrap();

    let report = manager.dispatch(&Message::new(triage(None)));
    assert_eq!(
        report.reply,
        Some(Reply::Nack("no interop interfaces can handle Triage messages".into()))
    );

    let report = manager.dispatch(&Message::new(stop_freeze()));
    assert!(report.is_nack());

    manager.disconnect_current_interops().unwrap();
    let report = manager.dispatch(&Message::new(display_feedback("nobody listening")));
    assert_eq!(report.reply, None);
    assert!(report.handled_by.is_empty());
}

#[test]
fn lesson_completed_disables_everything() {
    let (mut manager, shared) = manager(&["one", "two"]);
    manager.connect_interops(&[1, 2], InteractionMode::Learner).unwrap();
    shared.journal();

    let report = manager.dispatch(&Message::new(lesson_completed()));

    assert_eq!(report.reply, None);
    assert_eq!(shared.journal(), ["disable one", "disable two"]);
    assert!(!manager.interface(1).unwrap().is_enabled());
}

#[test]
fn siman_directives_reach_enabled_interfaces() {
    let (mut manager, _shared) = manager(&["one"]);
    manager.connect_interops(&[1], InteractionMode::Learner).unwrap();
    let report = manager.dispatch(&Message::new(siman(SimanKind::Pause)));
    assert_eq!(report.reply, Some(Reply::Ack));
}

#[test]
fn first_answer_wins_and_errors_surface_only_without_one() {
    let (mut manager, shared) = manager(&["one", "two", "three"]);
    manager
        .connect_interops(&[1, 2, 3], InteractionMode::Learner)
        .unwrap();

    assert_eq!(manager.scenarios().unwrap(), None);

    shared.faults.lock().query_error.insert("one".into());
    let err = manager.scenarios().unwrap_err();
    assert!(matches!(err, HubError::Query { what: "scenarios", .. }));

    {
        let mut faults = shared.faults.lock();
        faults.scenarios.insert("two".into());
        faults.scenarios.insert("three".into());
    }
    let listing = manager.scenarios().unwrap().unwrap();
    assert_eq!(listing[0].id, "two");
}

#[test]
fn load_broadcast_reaches_configured_interfaces_in_order() {
    let (mut manager, shared) = manager(&["one", "two", "three"]);
    manager.connect_interops(&[1, 3], InteractionMode::Learner).unwrap();
    shared.journal();
    manager.load_scenario(Some("ward")).unwrap();
    assert_eq!(
        shared.journal(),
        ["load one Some(\"ward\")", "load three Some(\"ward\")"]
    );
}

#[test]
fn unknown_implementation_fails_the_build() {
    let mut bad = config(1, "stray");
    bad.implementation = "interop.nowhere.Missing".into();
    let err = InteropManager::builder()
        .with_default_plugins()
        .configs([bad])
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "interop `stray` names unknown implementation `interop.nowhere.Missing`"
    );
}

#[test]
fn default_plugins_build_the_sample_configuration() {
    let manager = InteropManager::builder()
        .with_default_plugins()
        .launcher(Arc::new(ScriptedLauncher::ready("ready")))
        .config_str(testdata::SAMPLE_CONFIG)
        .unwrap()
        .build()
        .unwrap();

    let ids: Vec<_> = manager.configs().map(|config| config.ref_id).collect();
    assert_eq!(ids, [1, 2]);
    let triage = manager.interfaces_for(TrainingApplication::TriageSim);
    assert_eq!(triage.len(), 1);
    assert_eq!(triage[0].name, "Triage Simulator");
    assert!(manager.interfaces_for(TrainingApplication::BatchLauncher).is_empty());
    assert_eq!(manager.applications().len(), 2);
    assert!(manager.produced().is_empty());
}
