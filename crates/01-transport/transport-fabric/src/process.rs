//! External process seam.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::TransportResult;

/// What to launch and how.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Exit status observed for a process that has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Handle to a launched external application.
pub trait ExternalProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Non-destructive exit check. `Ok(None)` while still running.
    fn try_exit(&mut self) -> TransportResult<Option<ProcessExit>>;

    /// Blocks until a line of output contains `marker`, returning that line.
    fn wait_for_line(&mut self, marker: &str, timeout: Duration) -> TransportResult<String>;

    /// Forcibly stops the process and reaps it.
    fn terminate(&mut self) -> TransportResult<()>;
}

pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> TransportResult<Box<dyn ExternalProcess>>;
}

/// Stops `process` unless it already exited. Returns whether a terminate was issued.
pub fn shutdown_process(process: &mut dyn ExternalProcess) -> TransportResult<bool> {
    if let Some(exit) = process.try_exit()? {
        debug!(pid = ?process.id(), code = ?exit.code, "process already exited");
        return Ok(false);
    }
    process.terminate()?;
    Ok(true)
}
