use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver};
use interop_batch::BatchLauncherFactory;
use interop_common::{
    InteropInterface, InteropResult, MessageSink, PluginContext, PluginFactory, WindowControl,
};
use interop_simple::SimpleExampleFactory;
use interop_triage::TriageSimFactory;
use message_abi::{
    InteractionMode, Message, MessageType, Scenario, ScenarioMetadata, ScenarioSummary,
    SelectableObject, TrainingApplication,
};
use runtime_native::NativeLauncher;
use smallvec::SmallVec;
use tracing::{error, info, warn};
use transport_fabric::ProcessLauncher;

use crate::config::{parse_config, InteropConfig};
use crate::dispatch::{DispatchReport, Reply, OPTIONAL_MESSAGE_TYPES};
use crate::error::{Failure, Failures, HubError};

struct Entry {
    config: InteropConfig,
    interface: Box<dyn InteropInterface>,
}

/// Owns every instantiated interop interface, in configuration order.
pub struct InteropManager {
    entries: Vec<Entry>,
    produced: Receiver<Message>,
}

impl InteropManager {
    pub fn builder() -> InteropManagerBuilder {
        InteropManagerBuilder::new()
    }

    /// Messages produced by interfaces, in arrival order.
    pub fn produced(&self) -> &Receiver<Message> {
        &self.produced
    }

    pub fn configs(&self) -> impl Iterator<Item = &InteropConfig> {
        self.entries.iter().map(|entry| &entry.config)
    }

    pub fn interface(&self, ref_id: u32) -> Option<&dyn InteropInterface> {
        self.entries
            .iter()
            .find(|entry| entry.config.ref_id == ref_id)
            .map(|entry| entry.interface.as_ref())
    }

    /// Configured interfaces that drive `application`.
    pub fn interfaces_for(&self, application: TrainingApplication) -> Vec<&InteropConfig> {
        self.configs()
            .filter(|config| config.training_application == application)
            .collect()
    }

    /// Application to interface configurations, each list in configuration order.
    pub fn applications(&self) -> BTreeMap<TrainingApplication, Vec<&InteropConfig>> {
        let mut by_app: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for config in self.configs() {
            by_app
                .entry(config.training_application)
                .or_default()
                .push(config);
        }
        by_app
    }

    /// Configures, enables and sets the mode of each selected interface in order.
    ///
    /// On the first failure every interface enabled by this call is disabled
    /// again and one error lists the failing interface and any rollback failures.
    /// Optional interfaces whose installation is missing are skipped.
    pub fn connect_interops(
        &mut self,
        ref_ids: &[u32],
        mode: InteractionMode,
    ) -> Result<(), HubError> {
        let indices = ref_ids
            .iter()
            .map(|&id| self.index_of(id).ok_or(HubError::UnknownInterop(id)))
            .collect::<Result<SmallVec<[usize; 4]>, _>>()?;

        let mut enabled_here: SmallVec<[usize; 4]> = SmallVec::new();
        for idx in indices {
            let entry = &mut self.entries[idx];
            let was_enabled = entry.interface.is_enabled();
            let result = connect_one(entry.interface.as_mut(), &entry.config, mode, || {
                if !was_enabled {
                    enabled_here.push(idx);
                }
            });
            let Err(err) = result else { continue };

            error!(interface = %entry.config.name, error = %err, "connect failed; rolling back");
            let mut failures = Failures::new();
            failures.push(Failure::new(entry.config.name.clone(), err));
            for &done in enabled_here.iter().rev() {
                let entry = &mut self.entries[done];
                if let Err(err) = entry.interface.set_enabled(false) {
                    warn!(interface = %entry.config.name, error = %err, "rollback disable failed");
                    failures.push(Failure::new(
                        entry.config.name.clone(),
                        format!("rollback: {err}"),
                    ));
                }
            }
            return Err(HubError::Connect(failures));
        }
        Ok(())
    }

    /// Unloads, disables, then cleans up every interface enabled at call time.
    ///
    /// Each stage runs for every interface before the next begins, and every
    /// failure is reported once all stages have run.
    pub fn disconnect_current_interops(&mut self) -> Result<(), HubError> {
        let targets: SmallVec<[usize; 4]> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.interface.is_enabled())
            .map(|(idx, _)| idx)
            .collect();

        let mut failures = Failures::new();
        let stages: [(&str, fn(&mut dyn InteropInterface) -> InteropResult<()>); 3] = [
            ("unload", |interface| interface.load_scenario(None)),
            ("disable", |interface| interface.set_enabled(false)),
            ("cleanup", |interface| interface.cleanup()),
        ];
        for (stage, step) in stages {
            for &idx in &targets {
                let entry = &mut self.entries[idx];
                if let Err(err) = step(entry.interface.as_mut()) {
                    warn!(interface = %entry.config.name, stage, error = %err, "disconnect step failed");
                    failures.push(Failure::new(
                        entry.config.name.clone(),
                        format!("{stage}: {err}"),
                    ));
                }
            }
        }
        info!(count = targets.len(), "interop interfaces disconnected");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HubError::Disconnect(failures))
        }
    }

    /// Delivers `message` to every enabled interface that supports its type.
    ///
    /// All matching interfaces are attempted; the reply is a NACK listing every
    /// error, an ACK when nobody replied, or nothing when an interface replied
    /// itself. A lesson-completed message also disables every enabled interface.
    pub fn dispatch(&mut self, message: &Message) -> DispatchReport {
        let message_type = message.message_type();
        let mut report = DispatchReport::default();
        let mut errors: SmallVec<[String; 4]> = SmallVec::new();
        let mut replied = false;
        let mut attempted = 0usize;

        for entry in &mut self.entries {
            let interface = entry.interface.as_mut();
            if !interface.is_enabled() || !interface.registration().supports(message_type) {
                continue;
            }
            attempted += 1;
            let outcome = interface.handle_message(message);
            replied |= outcome.replied;
            match outcome.error {
                Some(err) => {
                    warn!(interface = %entry.config.name, %message_type, error = %err, "dispatch failed");
                    errors.push(err.to_string());
                }
                None => report.handled_by.push(entry.config.name.clone()),
            }
        }

        report.reply = if attempted == 0 {
            if OPTIONAL_MESSAGE_TYPES.contains(&message_type) {
                None
            } else {
                Some(Reply::Nack(format!(
                    "no interop interfaces can handle {message_type} messages"
                )))
            }
        } else if !errors.is_empty() {
            Some(Reply::Nack(errors.join("\n")))
        } else if replied {
            None
        } else {
            Some(Reply::Ack)
        };

        if message_type == MessageType::LessonCompleted {
            self.disable_all("lesson completed");
        }
        report
    }

    pub fn scenarios(&self) -> Result<Option<Vec<ScenarioSummary>>, HubError> {
        self.fan_out("scenarios", |interface| interface.scenarios())
    }

    pub fn current_scenario_metadata(&self) -> Result<Option<ScenarioMetadata>, HubError> {
        self.fan_out("current scenario metadata", |interface| {
            interface.current_scenario_metadata()
        })
    }

    pub fn selectable_objects(&self) -> Result<Option<Vec<SelectableObject>>, HubError> {
        self.fan_out("selectable objects", |interface| {
            interface.selectable_objects()
        })
    }

    pub fn export_scenario(&self) -> Result<Option<Arc<Scenario>>, HubError> {
        self.fan_out("export scenario", |interface| interface.export_scenario())
    }

    /// Broadcasts a selection; the first failure aborts the broadcast.
    pub fn select_object(&mut self, object_id: &str) -> Result<(), HubError> {
        self.broadcast("select object", |interface| {
            interface.select_object(object_id).map(drop)
        })
    }

    /// Broadcasts a scenario load (or unload); the first failure aborts the broadcast.
    pub fn load_scenario(&mut self, scenario: Option<&str>) -> Result<(), HubError> {
        self.broadcast("load scenario", |interface| interface.load_scenario(scenario))
    }

    /// Best-effort teardown of everything, for process exit.
    pub fn shutdown(&mut self) {
        self.disable_all("shutdown");
        for entry in &mut self.entries {
            if let Err(err) = entry.interface.cleanup() {
                warn!(interface = %entry.config.name, error = %err, "cleanup failed during shutdown");
            }
        }
    }

    fn index_of(&self, ref_id: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.config.ref_id == ref_id)
    }

    fn disable_all(&mut self, why: &str) {
        for entry in &mut self.entries {
            if !entry.interface.is_enabled() {
                continue;
            }
            match entry.interface.set_enabled(false) {
                Ok(()) => info!(interface = %entry.config.name, why, "interface disabled"),
                Err(err) => warn!(interface = %entry.config.name, why, error = %err, "disable failed"),
            }
        }
    }

    fn fan_out<T>(
        &self,
        what: &'static str,
        query: impl Fn(&dyn InteropInterface) -> InteropResult<Option<T>>,
    ) -> Result<Option<T>, HubError> {
        let mut failures = Failures::new();
        for entry in &self.entries {
            let interface = entry.interface.as_ref();
            if !interface.core().is_configured() {
                continue;
            }
            match query(interface) {
                Ok(Some(answer)) => return Ok(Some(answer)),
                Ok(None) => {}
                Err(err) => {
                    warn!(interface = %entry.config.name, what, error = %err, "query failed");
                    failures.push(Failure::new(entry.config.name.clone(), err));
                }
            }
        }
        if failures.is_empty() {
            Ok(None)
        } else {
            Err(HubError::Query { what, failures })
        }
    }

    fn broadcast(
        &mut self,
        what: &'static str,
        mut action: impl FnMut(&mut dyn InteropInterface) -> InteropResult<()>,
    ) -> Result<(), HubError> {
        for entry in &mut self.entries {
            if !entry.interface.core().is_configured() {
                continue;
            }
            if let Err(source) = action(entry.interface.as_mut()) {
                error!(interface = %entry.config.name, what, error = %source, "broadcast aborted");
                return Err(HubError::Broadcast {
                    interface: entry.config.name.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

/// Returns after `configure -> enable -> mode`, calling `on_enabled` as soon
/// as the interface is live so a later mode failure is still rolled back.
fn connect_one(
    interface: &mut dyn InteropInterface,
    config: &InteropConfig,
    mode: InteractionMode,
    on_enabled: impl FnOnce(),
) -> InteropResult<()> {
    if !interface.is_enabled() {
        interface.configure(&config.input)?;
        if !interface.is_available() {
            warn!(interface = %config.name, "optional interface unavailable; not enabled");
            return Ok(());
        }
        interface.set_enabled(true)?;
        on_enabled();
    }
    interface.set_interaction_mode(mode)
}

/// Builder for an [`InteropManager`].
pub struct InteropManagerBuilder {
    factories: BTreeMap<String, Arc<dyn PluginFactory>>,
    launcher: Option<Arc<dyn ProcessLauncher>>,
    window: Option<Arc<dyn WindowControl>>,
    configs: Vec<InteropConfig>,
}

impl InteropManagerBuilder {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            launcher: None,
            window: None,
            configs: Vec::new(),
        }
    }

    /// Registers the bundled plugins.
    pub fn with_default_plugins(self) -> Self {
        self.plugin(SimpleExampleFactory)
            .plugin(TriageSimFactory)
            .plugin(BatchLauncherFactory)
    }

    pub fn plugin(mut self, factory: impl PluginFactory + 'static) -> Self {
        self.factories
            .insert(factory.implementation().to_string(), Arc::new(factory));
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn window(mut self, window: Arc<dyn WindowControl>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn configs(mut self, configs: impl IntoIterator<Item = InteropConfig>) -> Self {
        self.configs.extend(configs);
        self
    }

    pub fn config_str(self, text: &str) -> Result<Self> {
        let configs = parse_config(text)?;
        Ok(self.configs(configs))
    }

    /// Instantiates every available configured interface, left unconfigured.
    pub fn build(self) -> Result<InteropManager> {
        let (tx, produced) = unbounded();
        let mut ctx = PluginContext::new(
            self.launcher.unwrap_or_else(|| Arc::new(NativeLauncher)),
            MessageSink::new(tx),
        );
        if let Some(window) = self.window {
            ctx = ctx.with_window(window);
        }

        let mut entries = Vec::with_capacity(self.configs.len());
        for config in self.configs {
            let factory = self.factories.get(&config.implementation).ok_or_else(|| {
                HubError::UnknownImplementation {
                    name: config.name.clone(),
                    implementation: config.implementation.clone(),
                }
            })?;
            if !config.available {
                warn!(interop = %config.name, "interop marked unavailable; skipping");
                continue;
            }
            let interface = factory.create(&config.name, ctx.clone());
            info!(interop = %config.name, ref_id = config.ref_id, implementation = %config.implementation, "interop instantiated");
            entries.push(Entry { config, interface });
        }
        if entries.is_empty() {
            info!("no interop interfaces configured");
        }
        Ok(InteropManager { entries, produced })
    }
}

impl Default for InteropManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
