use std::fmt::Display;

use tracing::warn;

use crate::error::{InteropError, InteropResult};

/// Collects failures from best-effort teardown steps so every step runs.
#[derive(Debug)]
pub struct Teardown {
    interface: String,
    failures: Vec<String>,
}

impl Teardown {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            failures: Vec::new(),
        }
    }

    /// Records `result` under `step`, returning the success value if any.
    pub fn step<T, E: Display>(&mut self, step: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(interface = %self.interface, step, error = %err, "teardown step failed");
                self.failures.push(format!("{step}: {err}"));
                None
            }
        }
    }

    pub fn finish(self) -> InteropResult<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(InteropError::Teardown {
                interface: self.interface,
                failures: self.failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_step_runs_and_failures_are_joined() {
        let mut teardown = Teardown::new("Sampler");
        let mut ran = Vec::new();
        for (idx, step) in ["close", "stop", "reap"].into_iter().enumerate() {
            ran.push(step);
            let result: Result<(), String> = if idx == 1 { Ok(()) } else { Err(format!("{step} broke")) };
            teardown.step(step, result);
        }
        assert_eq!(ran, ["close", "stop", "reap"]);
        let err = teardown.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sampler: teardown incomplete: close: close broke; reap: reap broke"
        );
    }
}
