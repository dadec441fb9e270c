//! Interop plugin for applications started with a prepared input file.
//!
//! The install root comes from an environment variable. A SIMAN LOAD writes
//! this interface's load arguments as a JSON hand-off file and launches the
//! install's script with the file path as its only argument.

use std::path::PathBuf;

use interop_common::{
    BatchInput, ConfigurationError, InteropCore, InteropError, InteropInput, InteropInterface,
    InteropResult, PluginContext, PluginFactory, Registration, Teardown, WindowControl,
};
use message_abi::{LoadArgs, MessageType, ScenarioSummary, TrainingApplication};
use runtime_native::{discover_install, BatchHandoff, Installation};
use serde_json::{Map, Value};
use tracing::{info, warn};
use transport_fabric::{shutdown_process, ExternalProcess, LaunchSpec};

pub const IMPLEMENTATION: &str = "interop.batch.BatchLauncherInterface";

const HANDOFF_EXTENSION: &str = "json";

#[derive(Clone, Copy, Debug, Default)]
pub struct BatchLauncherFactory;

impl PluginFactory for BatchLauncherFactory {
    fn implementation(&self) -> &str {
        IMPLEMENTATION
    }

    fn create(&self, name: &str, ctx: PluginContext) -> Box<dyn InteropInterface> {
        Box::new(BatchLauncherInterface::new(name, ctx))
    }
}

struct Configured {
    install: Installation,
    handoff: BatchHandoff,
    default_scenario: Option<String>,
}

pub struct BatchLauncherInterface {
    registration: Registration,
    core: InteropCore,
    ctx: PluginContext,
    configured: Option<Configured>,
    process: Option<Box<dyn ExternalProcess>>,
    last_handoff: Option<PathBuf>,
    loaded: Option<String>,
}

impl BatchLauncherInterface {
    pub fn new(name: &str, ctx: PluginContext) -> Self {
        Self {
            registration: Registration::builder(IMPLEMENTATION, name)
                .supports([MessageType::Siman])
                .requires(TrainingApplication::BatchLauncher)
                .build(),
            core: InteropCore::new(name),
            ctx,
            configured: None,
            process: None,
            last_handoff: None,
            loaded: None,
        }
    }

    pub fn loaded_scenario(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    /// Hand-off file written by the most recent load.
    pub fn last_handoff(&self) -> Option<&std::path::Path> {
        self.last_handoff.as_deref()
    }

    fn settings(&self) -> InteropResult<&Configured> {
        self.configured
            .as_ref()
            .ok_or_else(|| InteropError::dispatch(self.core.name(), "no installation configured"))
    }

    fn stop_process(&mut self) -> InteropResult<()> {
        if let Some(mut process) = self.process.take() {
            if shutdown_process(process.as_mut())? {
                info!(interface = %self.core.name(), "launched script stopped");
            }
        }
        Ok(())
    }

    fn launch(&mut self, handoff: PathBuf) -> InteropResult<()> {
        if !self.core.is_enabled() {
            return Err(InteropError::dispatch(
                self.core.name(),
                "cannot launch while not enabled",
            ));
        }
        self.stop_process()?;
        let settings = self.settings()?;
        let spec = LaunchSpec::new(&settings.install.script)
            .arg(handoff.display().to_string())
            .current_dir(&settings.install.root);
        let process = self.ctx.launcher.launch(&spec)?;
        info!(
            interface = %self.core.name(),
            pid = ?process.id(),
            handoff = %handoff.display(),
            "launched with hand-off"
        );
        self.process = Some(process);
        self.last_handoff = Some(handoff);
        Ok(())
    }
}

impl InteropInterface for BatchLauncherInterface {
    fn registration(&self) -> &Registration {
        &self.registration
    }

    fn core(&self) -> &InteropCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut InteropCore {
        &mut self.core
    }

    /// A missing installation marks the interface unavailable. Only a
    /// `required` installation fails configuration.
    fn configure(&mut self, input: &InteropInput) -> InteropResult<()> {
        let BatchInput {
            install_env,
            launch_script,
            handoff_dir,
            scenario,
            required,
        } = input.as_batch()?;
        match discover_install(install_env, launch_script) {
            Ok(install) => {
                let dir = handoff_dir
                    .clone()
                    .unwrap_or_else(|| install.root.join("handoff"));
                self.configured = Some(Configured {
                    handoff: BatchHandoff::new(dir),
                    install,
                    default_scenario: scenario.clone(),
                });
                self.core.configured()
            }
            Err(err) => {
                self.core.mark_unavailable(&err.to_string());
                if *required {
                    return Err(ConfigurationError::Discovery {
                        reason: err.to_string(),
                    }
                    .into());
                }
                warn!(interface = %self.core.name(), error = %err, "optional installation missing");
                self.core.configured()
            }
        }
    }

    fn set_enabled(&mut self, enabled: bool) -> InteropResult<()> {
        if !self.core.needs_transition(enabled)? {
            return Ok(());
        }
        if enabled {
            self.settings()?;
            self.core.enabled();
            Ok(())
        } else {
            let mut teardown = Teardown::new(self.core.name());
            let stopped = self.stop_process();
            teardown.step("stop script", stopped);
            self.core.disabled();
            teardown.finish()
        }
    }

    fn on_load(&mut self, args: Option<&LoadArgs>) -> InteropResult<()> {
        if !self.core.is_enabled() {
            return Err(InteropError::dispatch(
                self.core.name(),
                "cannot load while not enabled",
            ));
        }
        let settings = self.settings()?;
        let scenario = args
            .and_then(LoadArgs::scenario)
            .map(str::to_string)
            .or_else(|| settings.default_scenario.clone())
            .ok_or_else(|| {
                InteropError::scenario(self.core.name(), "no scenario named by load arguments")
            })?;

        let mut params = Map::new();
        for (key, value) in args.into_iter().flat_map(LoadArgs::iter) {
            params.insert(key.to_string(), Value::from(value));
        }
        params.insert(
            LoadArgs::SCENARIO_KEY.to_string(),
            Value::from(scenario.as_str()),
        );
        let document = serde_json::to_vec_pretty(&Value::Object(params))
            .map_err(|err| InteropError::scenario(self.core.name(), err.to_string()))?;

        let name = format!("{}.{HANDOFF_EXTENSION}", file_stem(&scenario));
        let path = settings
            .handoff
            .write(&name, &document)
            .map_err(|err| {
                InteropError::scenario(
                    self.core.name(),
                    format!("could not write hand-off {name}: {err}"),
                )
            })?;
        self.launch(path)?;
        self.loaded = Some(scenario);
        Ok(())
    }

    fn load_scenario(&mut self, scenario: Option<&str>) -> InteropResult<()> {
        match scenario {
            Some(id) => self.on_load(Some(&LoadArgs::new().with(LoadArgs::SCENARIO_KEY, id))),
            None => {
                self.loaded = None;
                self.stop_process()
            }
        }
    }

    fn cleanup(&mut self) -> InteropResult<()> {
        let mut teardown = Teardown::new(self.core.name());
        let stopped = self.stop_process();
        teardown.step("stop script", stopped);
        teardown.finish()
    }

    fn stop_application(&mut self) -> InteropResult<()> {
        self.stop_process()
    }

    fn restart_application(&mut self) -> InteropResult<()> {
        let handoff = self.last_handoff.clone().ok_or_else(|| {
            InteropError::scenario(self.core.name(), "nothing has been loaded to restart")
        })?;
        self.launch(handoff)
    }

    fn window(&self) -> Option<&dyn WindowControl> {
        Some(self.ctx.window.as_ref())
    }

    fn scenarios(&self) -> InteropResult<Option<Vec<ScenarioSummary>>> {
        let Some(settings) = self.configured.as_ref() else {
            return Ok(None);
        };
        let files = settings
            .handoff
            .list(HANDOFF_EXTENSION)
            .map_err(|err| InteropError::scenario(self.core.name(), err.to_string()))?;
        let summaries = files
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| {
                let id = stem.to_string_lossy().into_owned();
                ScenarioSummary {
                    title: id.replace(['_', '-'], " "),
                    id,
                }
            })
            .collect();
        Ok(Some(summaries))
    }
}

/// Scenario ids become file names; anything outside `[A-Za-z0-9_-]` is replaced.
fn file_stem(scenario: &str) -> String {
    scenario
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_ids_are_made_file_safe() {
        assert_eq!(file_stem("convoy-ambush_2"), "convoy-ambush_2");
        assert_eq!(file_stem("../etc/passwd"), "___etc_passwd");
        assert_eq!(file_stem("day 1"), "day_1");
    }
}
