//! Scripted stand-in for launching external applications.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use transport_fabric::{
    ExternalProcess, LaunchSpec, ProcessExit, ProcessLauncher, TransportError, TransportResult,
};

/// How every process launched by a [`ScriptedLauncher`] behaves.
#[derive(Clone, Debug)]
pub enum ScriptedBehavior {
    /// Prints `line` right away and runs until terminated.
    Ready { line: String },
    /// Runs but never prints anything.
    NeverReady,
    /// Launch itself fails.
    LaunchFails { error: String },
    /// Prints `line` and has already exited by the time anyone asks.
    ExitsImmediately { line: String, code: i32 },
}

/// What happened to one launched process.
#[derive(Clone, Debug, Default)]
pub struct LaunchRecord {
    pub spec: LaunchSpec,
    pub terminate_calls: u32,
    pub exited: bool,
}

#[derive(Clone)]
pub struct ScriptedLauncher {
    behavior: ScriptedBehavior,
    records: Arc<Mutex<Vec<Arc<Mutex<LaunchRecord>>>>>,
}

impl ScriptedLauncher {
    pub fn new(behavior: ScriptedBehavior) -> Self {
        Self {
            behavior,
            records: Arc::default(),
        }
    }

    pub fn ready(line: &str) -> Self {
        Self::new(ScriptedBehavior::Ready { line: line.into() })
    }

    /// Snapshot of every launch so far, in order.
    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.records
            .lock()
            .iter()
            .map(|record| record.lock().clone())
            .collect()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(&self, spec: &LaunchSpec) -> TransportResult<Box<dyn ExternalProcess>> {
        let (output, exit) = match &self.behavior {
            ScriptedBehavior::LaunchFails { error } => {
                return Err(TransportError::Launch {
                    program: spec.program.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, error.clone()),
                })
            }
            ScriptedBehavior::Ready { line } => (vec![line.clone()], None),
            ScriptedBehavior::NeverReady => (Vec::new(), None),
            ScriptedBehavior::ExitsImmediately { line, code } => {
                (vec![line.clone()], Some(ProcessExit { code: Some(*code) }))
            }
        };
        let record = Arc::new(Mutex::new(LaunchRecord {
            spec: spec.clone(),
            terminate_calls: 0,
            exited: exit.is_some(),
        }));
        self.records.lock().push(Arc::clone(&record));
        let pid = 40_000 + self.records.lock().len() as u32;
        Ok(Box::new(ScriptedProcess {
            pid,
            output,
            exit,
            record,
        }))
    }
}

struct ScriptedProcess {
    pid: u32,
    output: Vec<String>,
    exit: Option<ProcessExit>,
    record: Arc<Mutex<LaunchRecord>>,
}

impl ExternalProcess for ScriptedProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_exit(&mut self) -> TransportResult<Option<ProcessExit>> {
        Ok(self.exit)
    }

    fn wait_for_line(&mut self, marker: &str, timeout: Duration) -> TransportResult<String> {
        if let Some(line) = self.output.iter().find(|line| line.contains(marker)) {
            return Ok(line.clone());
        }
        if self.exit.is_some() {
            return Err(TransportError::closed("scripted process output"));
        }
        Err(TransportError::Timeout {
            waiting_for: format!("`{marker}`"),
            after: timeout,
        })
    }

    fn terminate(&mut self) -> TransportResult<()> {
        let mut record = self.record.lock();
        record.terminate_calls += 1;
        record.exited = true;
        self.exit = Some(ProcessExit { code: None });
        Ok(())
    }
}
