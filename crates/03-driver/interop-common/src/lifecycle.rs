//! Lifecycle bookkeeping every interface embeds.

use std::fmt;

use message_abi::InteractionMode;
use tracing::{info, warn};

use crate::error::{InteropError, InteropResult};

/// `Unconfigured -> Configured -> Enabled <-> Disabled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteropState {
    Unconfigured,
    Configured,
    Enabled,
    Disabled,
}

impl fmt::Display for InteropState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InteropState::Unconfigured => "unconfigured",
            InteropState::Configured => "configured",
            InteropState::Enabled => "enabled",
            InteropState::Disabled => "disabled",
        })
    }
}

#[derive(Debug)]
pub struct InteropCore {
    name: String,
    state: InteropState,
    available: bool,
    mode: InteractionMode,
}

impl InteropCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: InteropState::Unconfigured,
            available: true,
            mode: InteractionMode::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> InteropState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == InteropState::Enabled
    }

    pub fn is_configured(&self) -> bool {
        self.state != InteropState::Unconfigured
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Sticky: an unavailable interface never becomes available again.
    pub fn mark_unavailable(&mut self, reason: &str) {
        if self.available {
            warn!(interface = %self.name, %reason, "interface marked unavailable");
        }
        self.available = false;
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    /// Records a successful `configure`. Reconfiguring a live interface is refused.
    pub fn configured(&mut self) -> InteropResult<()> {
        if self.state == InteropState::Enabled {
            return Err(self.invalid("configure"));
        }
        self.state = InteropState::Configured;
        info!(interface = %self.name, "configured");
        Ok(())
    }

    /// Whether `set_enabled(enabled)` has work to do from the current state.
    ///
    /// Repeated enables and disables are no-ops. Enabling requires a prior
    /// `configure` and an available interface.
    pub fn needs_transition(&self, enabled: bool) -> InteropResult<bool> {
        match (enabled, self.state) {
            (true, InteropState::Enabled) => Ok(false),
            (true, InteropState::Unconfigured) => Err(self.invalid("enable")),
            (true, _) if !self.available => Err(InteropError::Unavailable {
                interface: self.name.clone(),
            }),
            (true, _) => Ok(true),
            (false, InteropState::Enabled) => Ok(true),
            (false, _) => Ok(false),
        }
    }

    pub fn enabled(&mut self) {
        self.state = InteropState::Enabled;
        info!(interface = %self.name, "enabled");
    }

    pub fn disabled(&mut self) {
        self.state = InteropState::Disabled;
        info!(interface = %self.name, "disabled");
    }

    fn invalid(&self, action: &'static str) -> InteropError {
        InteropError::InvalidTransition {
            interface: self.name.clone(),
            from: self.state,
            action,
        }
    }
}
