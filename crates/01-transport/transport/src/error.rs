//! Error handling helpers for the framing layer.
//!
//! Framing only fails on short reads, absurd lengths and I/O; everything that
//! concerns the payload contents is the codec's business.

use std::fmt;
use std::io;

/// Convenience result alias for fallible framing operations.
pub type FrameResult<T, E = FrameError> = Result<T, E>;

/// Errors surfaced while reading or writing frame logs.
#[derive(Debug)]
pub enum FrameError {
    /// The stream ended inside a frame.
    Truncated {
        /// Which part of the frame was cut short (`header` or `payload`).
        section: &'static str,
        /// Bytes the frame declared.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },
    /// Declared frame length exceeds [`crate::MAX_FRAME_LEN`] or is shorter than the header.
    BadLength { declared: usize },
    /// Underlying reader or writer failed.
    Io(io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated {
                section,
                expected,
                actual,
            } => write!(
                f,
                "truncated frame {section}: expected {expected} bytes, got {actual}"
            ),
            FrameError::BadLength { declared } => {
                write!(f, "frame length {declared} out of range")
            }
            FrameError::Io(err) => write!(f, "frame i/o failure: {err}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        FrameError::Io(err)
    }
}
