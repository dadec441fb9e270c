//! The contract every interop plugin implements.

use std::sync::Arc;

use message_abi::{
    InteractionMode, LoadArgs, Message, Payload, Scenario, ScenarioMetadata, ScenarioSummary,
    SelectableObject, Siman, SimanKind,
};
use tracing::{debug, info, warn};

use crate::context::WindowControl;
use crate::error::{InteropError, InteropResult};
use crate::input::InteropInput;
use crate::lifecycle::{InteropCore, InteropState};
use crate::registration::Registration;

/// Result of offering a message to one interface.
#[must_use]
#[derive(Debug, Default)]
pub struct HandleOutcome {
    /// The interface answered through its own channel.
    pub replied: bool,
    pub error: Option<InteropError>,
}

impl HandleOutcome {
    pub fn handled(replied: bool) -> Self {
        Self {
            replied,
            error: None,
        }
    }

    pub fn failed(error: InteropError) -> Self {
        Self {
            replied: false,
            error: Some(error),
        }
    }

    pub fn is_handled(&self) -> bool {
        self.error.is_none()
    }
}

/// Adapter between the gateway and one external training application.
///
/// Required methods cover the lifecycle; everything else has a default so
/// plugins only override the capabilities they actually have. Query
/// capabilities return `Ok(None)` when the interface has nothing to say.
pub trait InteropInterface: Send {
    fn registration(&self) -> &Registration;
    fn core(&self) -> &InteropCore;
    fn core_mut(&mut self) -> &mut InteropCore;

    /// Validates `input` and records it. Does not open anything.
    fn configure(&mut self, input: &InteropInput) -> InteropResult<()>;

    /// Opens transports on `true`, tears them down on `false`.
    ///
    /// Disabling runs every teardown step even when earlier ones fail and
    /// always ends in [`InteropState::Disabled`].
    fn set_enabled(&mut self, enabled: bool) -> InteropResult<()>;

    /// `None` unloads and returns the application to a neutral state.
    fn load_scenario(&mut self, scenario: Option<&str>) -> InteropResult<()>;

    /// Releases everything the interface still holds.
    fn cleanup(&mut self) -> InteropResult<()>;

    fn name(&self) -> &str {
        self.registration().display_name()
    }

    fn state(&self) -> InteropState {
        self.core().state()
    }

    fn is_enabled(&self) -> bool {
        self.core().is_enabled()
    }

    fn is_available(&self) -> bool {
        self.core().is_available()
    }

    fn set_interaction_mode(&mut self, mode: InteractionMode) -> InteropResult<()> {
        info!(interface = %self.name(), ?mode, "interaction mode set");
        self.core_mut().set_mode(mode);
        Ok(())
    }

    /// Routes `message` to the SIMAN handlers or [`on_message`](Self::on_message).
    ///
    /// Types outside the registration are refused without touching the plugin.
    fn handle_message(&mut self, message: &Message) -> HandleOutcome {
        let message_type = message.message_type();
        if !self.registration().supports(message_type) {
            debug!(interface = %self.name(), %message_type, "unsupported message refused");
            return HandleOutcome::failed(InteropError::unsupported(self.name(), message_type));
        }
        let result = match message.payload() {
            Payload::Siman(siman) => self.on_siman(siman).map(|()| false),
            _ => self.on_message(message),
        };
        match result {
            Ok(replied) => HandleOutcome::handled(replied),
            Err(err) => HandleOutcome::failed(err),
        }
    }

    /// Non-SIMAN supported messages. Returns whether the interface replied.
    fn on_message(&mut self, message: &Message) -> InteropResult<bool> {
        Err(InteropError::unsupported(
            self.name(),
            message.message_type(),
        ))
    }

    fn on_siman(&mut self, siman: &Siman) -> InteropResult<()> {
        debug!(interface = %self.name(), kind = %siman.kind, "siman");
        match siman.kind {
            SimanKind::Load => {
                let args = siman.load_args_for(self.registration().implementation());
                self.on_load(args)
            }
            SimanKind::Start | SimanKind::Resume => {
                self.on_directive(siman.kind)?;
                self.bring_to_front();
                Ok(())
            }
            SimanKind::Pause => {
                self.on_directive(siman.kind)?;
                self.send_to_back();
                Ok(())
            }
            SimanKind::Stop => self.stop_application(),
            SimanKind::Restart => self.restart_application(),
        }
    }

    /// SIMAN LOAD with this interface's load arguments, if any were addressed to it.
    fn on_load(&mut self, args: Option<&LoadArgs>) -> InteropResult<()> {
        let scenario = args.and_then(LoadArgs::scenario).ok_or_else(|| {
            InteropError::scenario(
                self.name(),
                format!(
                    "no `{}` load argument for {}",
                    LoadArgs::SCENARIO_KEY,
                    self.registration().implementation()
                ),
            )
        })?;
        self.load_scenario(Some(scenario))
    }

    /// START, PAUSE and RESUME, before the window action.
    fn on_directive(&mut self, _kind: SimanKind) -> InteropResult<()> {
        Ok(())
    }

    /// Asks the application to close or reset. The interface stays in its state.
    fn stop_application(&mut self) -> InteropResult<()> {
        Ok(())
    }

    fn restart_application(&mut self) -> InteropResult<()> {
        Ok(())
    }

    fn window(&self) -> Option<&dyn WindowControl> {
        None
    }

    fn bring_to_front(&self) {
        if let Some(window) = self.window() {
            if let Err(reason) = window.foreground(self.name()) {
                warn!(interface = %self.name(), %reason, "could not focus application");
            }
        }
    }

    fn send_to_back(&self) {
        if let Some(window) = self.window() {
            if let Err(reason) = window.background(self.name()) {
                warn!(interface = %self.name(), %reason, "could not background application");
            }
        }
    }

    fn scenarios(&self) -> InteropResult<Option<Vec<ScenarioSummary>>> {
        Ok(None)
    }

    fn current_scenario_metadata(&self) -> InteropResult<Option<ScenarioMetadata>> {
        Ok(None)
    }

    fn selectable_objects(&self) -> InteropResult<Option<Vec<SelectableObject>>> {
        Ok(None)
    }

    /// Returns whether the interface acted on the selection.
    fn select_object(&mut self, _object_id: &str) -> InteropResult<bool> {
        Ok(false)
    }

    fn export_scenario(&self) -> InteropResult<Option<Arc<Scenario>>> {
        Ok(None)
    }
}
