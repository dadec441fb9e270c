use std::io;
use std::time::Duration;

use thiserror::Error;

use transport::FrameError;

pub type CodecResult<T> = Result<T, CodecError>;
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures raised while converting between wire values and the message model.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("decode failure at `{path}`: {reason}")]
    Decode { path: String, reason: String },

    #[error("encode failure at `{path}`: {reason}")]
    Encode { path: String, reason: String },

    #[error("unknown message tag 0x{0:02X}")]
    UnknownTag(u8),

    #[error("unknown message type `{0}`")]
    UnknownType(String),

    #[error("envelope declares `{declared}` but payload carries `{actual}`")]
    TypeMismatch { declared: String, actual: String },

    #[error("schema version mismatch: {found} vs {expected}")]
    Version { found: u8, expected: u8 },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl CodecError {
    pub fn decode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn encode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::Encode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Required field missing from the wire value.
    pub fn missing(path: impl Into<String>) -> Self {
        CodecError::decode(path, "missing required field")
    }

    /// Prefixes the error path with the enclosing field. Other variants pass through.
    pub fn within(self, segment: impl AsRef<str>) -> Self {
        match self {
            CodecError::Decode { path, reason } => CodecError::Decode {
                path: join_path(segment.as_ref(), &path),
                reason,
            },
            CodecError::Encode { path, reason } => CodecError::Encode {
                path: join_path(segment.as_ref(), &path),
                reason,
            },
            other => other,
        }
    }

    /// Field path for decode/encode failures.
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::Decode { path, .. } | CodecError::Encode { path, .. } => Some(path),
            _ => None,
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.is_empty() {
        parent.to_string()
    } else if parent.is_empty() || child.starts_with('[') {
        format!("{parent}{child}")
    } else {
        format!("{parent}.{child}")
    }
}

/// Failures moving bytes to or from an external process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("could not connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        after: Duration,
    },

    #[error("rpc `{method}` failed: {reason}")]
    Rpc { method: String, reason: String },

    #[error("{0} is closed")]
    Closed(String),

    #[error("transport i/o failure: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    pub fn rpc(method: impl Into<String>, reason: impl Into<String>) -> Self {
        TransportError::Rpc {
            method: method.into(),
            reason: reason.into(),
        }
    }

    pub fn closed(what: impl Into<String>) -> Self {
        TransportError::Closed(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_join_with_dots_and_indices() {
        let err = CodecError::missing("label")
            .within("areas[0]")
            .within("trainees[1]")
            .within("scenario");
        assert_eq!(err.path(), Some("scenario.trainees[1].areas[0].label"));
    }

    #[test]
    fn index_segments_attach_without_dot() {
        let err = CodecError::decode("[2]", "not a number").within("head");
        assert_eq!(err.path(), Some("head[2]"));
    }

    #[test]
    fn non_path_errors_pass_through() {
        let err = CodecError::UnknownTag(0x7F).within("payload");
        assert!(err.path().is_none());
        assert_eq!(err.to_string(), "unknown message tag 0x7F");
    }
}
