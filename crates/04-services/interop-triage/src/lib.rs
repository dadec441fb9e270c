//! Interop plugin for the triage simulator.
//!
//! Every message travels as one binary frame per datagram. Outbound
//! directives and scenario definitions are sent from the calling thread; a
//! receive thread decodes whatever the simulator reports and hands it to the
//! message sink.

mod link;

use std::sync::Arc;

use interop_common::{
    InteropCore, InteropError, InteropInput, InteropInterface, InteropResult, PacketInput,
    PluginContext, PluginFactory, Registration, Teardown, WindowControl,
};
use message_abi::{
    LoadArgs, Message, MessageType, Payload, Scenario, ScenarioMetadata, ScenarioSummary,
    SelectableObject, Siman, SimanKind, TrainingApplication, TrainingEvent,
};
use parking_lot::Mutex;
use tracing::info;

use crate::link::Link;

pub const IMPLEMENTATION: &str = "interop.triage.TriageSimInterface";

/// Name of the event sent when an object is selected.
pub const OBJECT_SELECTED_EVENT: &str = "ObjectSelected";

#[derive(Clone, Copy, Debug, Default)]
pub struct TriageSimFactory;

impl PluginFactory for TriageSimFactory {
    fn implementation(&self) -> &str {
        IMPLEMENTATION
    }

    fn create(&self, name: &str, ctx: PluginContext) -> Box<dyn InteropInterface> {
        Box::new(TriageSimInterface::new(name, ctx))
    }
}

/// Scenario last sent to or reported by the simulator.
pub(crate) type CurrentScenario = Arc<Mutex<Option<Arc<Scenario>>>>;

pub struct TriageSimInterface {
    registration: Registration,
    core: InteropCore,
    ctx: PluginContext,
    input: Option<PacketInput>,
    link: Option<Link>,
    current: CurrentScenario,
    loaded: Option<String>,
}

impl TriageSimInterface {
    pub fn new(name: &str, ctx: PluginContext) -> Self {
        Self {
            registration: Registration::builder(IMPLEMENTATION, name)
                .supports([
                    MessageType::Siman,
                    MessageType::EnvironmentControl,
                    MessageType::ScenarioDefinition,
                ])
                .produces([
                    MessageType::Triage,
                    MessageType::TimerBatch,
                    MessageType::ScenarioDefinition,
                ])
                .requires(TrainingApplication::TriageSim)
                .build(),
            core: InteropCore::new(name),
            ctx,
            input: None,
            link: None,
            current: CurrentScenario::default(),
            loaded: None,
        }
    }

    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.link.as_ref().and_then(Link::local_addr)
    }

    pub fn loaded_scenario(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    fn send(&self, message: &Message) -> InteropResult<()> {
        let link = self.link.as_ref().ok_or_else(|| {
            InteropError::dispatch(
                self.core.name(),
                format!("cannot send {} while disabled", message.message_type()),
            )
        })?;
        link.send(message)
    }

    fn current(&self) -> Option<Arc<Scenario>> {
        self.current.lock().clone()
    }
}

impl InteropInterface for TriageSimInterface {
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
        let packet = input.as_packet()?;
        self.core.configured()?;
        self.input = Some(packet.clone());
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> InteropResult<()> {
        if !self.core.needs_transition(enabled)? {
            return Ok(());
        }
        if enabled {
            let input = self
                .input
                .as_ref()
                .ok_or_else(|| InteropError::dispatch(self.core.name(), "no input configured"))?;
            let link = Link::open(
                self.core.name(),
                input,
                self.ctx.sink.clone(),
                Arc::clone(&self.current),
                self.registration.produced().clone(),
            )?;
            self.link = Some(link);
            self.core.enabled();
            Ok(())
        } else {
            let mut teardown = Teardown::new(self.core.name());
            if let Some(link) = self.link.take() {
                link.close(&mut teardown);
            }
            self.core.disabled();
            teardown.finish()
        }
    }

    fn load_scenario(&mut self, scenario: Option<&str>) -> InteropResult<()> {
        match scenario {
            Some(id) => {
                let args = LoadArgs::new().with(LoadArgs::SCENARIO_KEY, id);
                let load = Siman::load().with_load_args(IMPLEMENTATION, args);
                self.send(&Message::new(load)).map_err(|err| {
                    InteropError::scenario(self.name(), format!("failed to load `{id}`: {err}"))
                })?;
                info!(interface = %self.name(), scenario = id, "scenario load sent");
                self.loaded = Some(id.to_string());
            }
            None => {
                self.loaded = None;
                *self.current.lock() = None;
                if self.link.is_some() {
                    self.send(&Message::new(Siman::directive(SimanKind::Stop)))?;
                }
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) -> InteropResult<()> {
        let mut teardown = Teardown::new(self.core.name());
        if let Some(link) = self.link.take() {
            link.close(&mut teardown);
        }
        *self.current.lock() = None;
        teardown.finish()
    }

    fn on_message(&mut self, message: &Message) -> InteropResult<bool> {
        match message.payload() {
            Payload::ScenarioDefinition(scenario) => {
                self.send(message)?;
                *self.current.lock() = Some(Arc::clone(scenario));
                Ok(false)
            }
            Payload::EnvironmentControl(_) => {
                self.send(message)?;
                Ok(false)
            }
            _ => Err(InteropError::unsupported(
                self.name(),
                message.message_type(),
            )),
        }
    }

    fn on_directive(&mut self, kind: SimanKind) -> InteropResult<()> {
        self.send(&Message::new(Siman::directive(kind)))
    }

    fn stop_application(&mut self) -> InteropResult<()> {
        self.send(&Message::new(Siman::directive(SimanKind::Stop)))
    }

    fn restart_application(&mut self) -> InteropResult<()> {
        self.send(&Message::new(Siman::directive(SimanKind::Restart)))
    }

    fn window(&self) -> Option<&dyn WindowControl> {
        Some(self.ctx.window.as_ref())
    }

    fn scenarios(&self) -> InteropResult<Option<Vec<ScenarioSummary>>> {
        Ok(self.current().map(|scenario| {
            vec![ScenarioSummary {
                id: scenario.id.to_string(),
                title: scenario.title.clone(),
            }]
        }))
    }

    fn current_scenario_metadata(&self) -> InteropResult<Option<ScenarioMetadata>> {
        Ok(self.current().map(|scenario| scenario.metadata()))
    }

    fn selectable_objects(&self) -> InteropResult<Option<Vec<SelectableObject>>> {
        Ok(self.current().map(|scenario| scenario.selectable_objects()))
    }

    fn select_object(&mut self, object_id: &str) -> InteropResult<bool> {
        let scenario = self
            .current()
            .ok_or_else(|| InteropError::scenario(self.name(), "no scenario is loaded"))?;
        let object = scenario
            .selectable_objects()
            .into_iter()
            .find(|object| object.id == object_id)
            .ok_or_else(|| {
                InteropError::scenario(
                    self.name(),
                    format!("scenario {} has no object `{object_id}`", scenario.id),
                )
            })?;
        let event = TrainingEvent::new(OBJECT_SELECTED_EVENT)
            .with("objectId", object.id)
            .with("name", object.name)
            .with("kind", format!("{:?}", object.kind));
        self.send(&Message::new(event))?;
        Ok(true)
    }

    fn export_scenario(&self) -> InteropResult<Option<Arc<Scenario>>> {
        Ok(self.current())
    }
}
