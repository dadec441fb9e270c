use std::fmt;

use message_abi::MessageType;
use thiserror::Error;
use transport_fabric::{CodecError, TransportError};

use crate::lifecycle::InteropState;
use crate::input::InputKind;

pub type InteropResult<T> = Result<T, InteropError>;

/// The configuration handed to an interface cannot be used.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("expected `{expected}` input, got `{actual}`")]
    WrongInput {
        expected: InputKind,
        actual: InputKind,
    },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("installation not found: {reason}")]
    Discovery { reason: String },

    #[error("invalid endpoint {endpoint}: {reason}")]
    Endpoint { endpoint: String, reason: String },
}

#[derive(Debug, Error)]
pub enum InteropError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{interface}: {reason}")]
    Dispatch { interface: String, reason: String },

    #[error("{interface}: teardown incomplete: {}", Joined(.failures))]
    Teardown {
        interface: String,
        failures: Vec<String>,
    },

    #[error("{interface}: cannot {action} while {from}")]
    InvalidTransition {
        interface: String,
        from: InteropState,
        action: &'static str,
    },

    #[error("{interface}: interface is unavailable")]
    Unavailable { interface: String },

    #[error("{interface}: scenario error: {reason}")]
    Scenario { interface: String, reason: String },
}

impl InteropError {
    /// `interface` received a message type it never registered for.
    pub fn unsupported(interface: impl Into<String>, message_type: MessageType) -> Self {
        InteropError::Dispatch {
            interface: interface.into(),
            reason: format!("message type `{message_type}` is not supported"),
        }
    }

    pub fn dispatch(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        InteropError::Dispatch {
            interface: interface.into(),
            reason: reason.into(),
        }
    }

    pub fn scenario(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        InteropError::Scenario {
            interface: interface.into(),
            reason: reason.into(),
        }
    }
}

struct Joined<'a>(&'a [String]);

impl fmt::Display for Joined<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, failure) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            f.write_str(failure)?;
        }
        Ok(())
    }
}
