//! External process management on top of `std::process`.

use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, trace, warn};
use transport_fabric::{
    ExternalProcess, LaunchSpec, ProcessExit, ProcessLauncher, TransportError, TransportResult,
};

/// Launches real operating-system processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeLauncher;

impl ProcessLauncher for NativeLauncher {
    fn launch(&self, spec: &LaunchSpec) -> TransportResult<Box<dyn ExternalProcess>> {
        let program = spec.program.display().to_string();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| TransportError::Launch {
            program: program.clone(),
            source,
        })?;
        info!(%program, pid = child.id(), "launched external process");

        let (tx, lines) = crossbeam_channel::unbounded();
        if let Some(stdout) = child.stdout.take() {
            let tag = program.clone();
            let spawned = thread::Builder::new()
                .name(format!("stdout-{}", child.id()))
                .spawn(move || {
                    for line in BufReader::new(stdout).lines() {
                        let Ok(line) = line else { break };
                        trace!(program = %tag, %line, "process output");
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                });
            if let Err(err) = spawned {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err.into());
            }
        }

        Ok(Box::new(NativeProcess {
            child,
            lines,
            program,
        }))
    }
}

/// Handle to a running child process and its captured stdout lines.
pub struct NativeProcess {
    child: Child,
    lines: Receiver<String>,
    program: String,
}

impl ExternalProcess for NativeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn try_exit(&mut self) -> TransportResult<Option<ProcessExit>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| ProcessExit { code: status.code() }))
    }

    fn wait_for_line(&mut self, marker: &str, timeout: Duration) -> TransportResult<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) if line.contains(marker) => {
                    debug!(program = %self.program, %line, "readiness marker observed");
                    return Ok(line);
                }
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TransportError::Timeout {
                        waiting_for: format!("`{marker}` from {}", self.program),
                        after: timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::closed(format!(
                        "output of {} before `{marker}`",
                        self.program
                    )))
                }
            }
        }
    }

    fn terminate(&mut self) -> TransportResult<()> {
        match self.child.kill() {
            Ok(()) => {}
            // Already reaped.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
            Err(err) => return Err(err.into()),
        }
        let status = self.child.wait()?;
        info!(program = %self.program, code = ?status.code(), "external process stopped");
        Ok(())
    }
}

impl Drop for NativeProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!(program = %self.program, "dropping live process handle; killing");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
