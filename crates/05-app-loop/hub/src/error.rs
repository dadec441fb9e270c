use std::fmt;
use std::io;
use std::path::PathBuf;

use interop_common::InteropError;
use smallvec::SmallVec;
use thiserror::Error;

/// One interface's failure within an aggregated operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub interface: String,
    pub reason: String,
}

impl Failure {
    pub fn new(interface: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            interface: interface.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Failures = SmallVec<[Failure; 4]>;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("could not read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid interop configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("interop `{name}` names unknown implementation `{implementation}`")]
    UnknownImplementation { name: String, implementation: String },

    #[error("no interop interface with ref id {0}")]
    UnknownInterop(u32),

    #[error("failed to connect interop interfaces:{}", Listed(.0))]
    Connect(Failures),

    #[error("failed to disconnect interop interfaces:{}", Listed(.0))]
    Disconnect(Failures),

    #[error("no interop interface answered `{what}`:{}", Listed(.failures))]
    Query {
        what: &'static str,
        failures: Failures,
    },

    #[error("{interface}: {source}")]
    Broadcast {
        interface: String,
        source: InteropError,
    },
}

impl HubError {
    /// Per-interface failures of an aggregated error; empty otherwise.
    pub fn failures(&self) -> &[Failure] {
        match self {
            HubError::Connect(failures)
            | HubError::Disconnect(failures)
            | HubError::Query { failures, .. } => failures,
            _ => &[],
        }
    }
}

struct Listed<'a>(&'a [Failure]);

impl fmt::Display for Listed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in self.0 {
            write!(f, "\n  {}: {}", failure.interface, failure.reason)?;
        }
        Ok(())
    }
}
