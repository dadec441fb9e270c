//! Wire-level primitives shared by every interop transport.
//!
//! This crate owns the pieces that sit directly on the bytes:
//! * [`Envelope`] – tag/version/flags header carried in front of every payload.
//! * [`schema`] – the versioned rkyv representation of every message payload.
//! * [`FrameWriter`] / [`FrameReader`] – length-delimited frame logs.
//! * [`FrameError`] – the small error surface for framing failures.

mod envelope;
mod error;
mod frame;
pub mod schema;

pub use envelope::Envelope;
pub use error::{FrameError, FrameResult};
pub use frame::{Frame, FrameReader, FrameWriter, FRAME_HEADER_LEN, MAX_FRAME_LEN};
pub use schema::*;
