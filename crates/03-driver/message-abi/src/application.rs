use std::fmt;

use serde::{Deserialize, Serialize};

/// External training applications the gateway knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingApplication {
    SimpleExample,
    TriageSim,
    BatchLauncher,
}

impl TrainingApplication {
    pub const fn as_str(self) -> &'static str {
        match self {
            TrainingApplication::SimpleExample => "simple-example",
            TrainingApplication::TriageSim => "triage-sim",
            TrainingApplication::BatchLauncher => "batch-launcher",
        }
    }
}

impl fmt::Display for TrainingApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is driving the external application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    #[default]
    Learner,
    Author,
}
