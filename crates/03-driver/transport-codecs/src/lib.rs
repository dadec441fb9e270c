//! Codec implementations for interop messages.
//!
//! Two encodings sit side by side for every message type:
//! * [`binary`] – the versioned rkyv schema from `transport`, framed by envelope tag.
//! * [`json`] – a camelCase JSON tree.
//!
//! [`BinaryMessageCodec`] and [`JsonMessageCodec`] wrap the per-type codecs
//! with the message envelope. All codecs are stateless unit structs.

#![allow(missing_docs)]

pub mod binary;
pub mod json;
mod message;

pub use message::{tag_for, type_for_tag, BinaryMessageCodec, JsonMessageCodec};

/// Area labels are checked in both encodings, on encode and on decode.
pub(crate) const EMPTY_LABEL: &str = "must not be empty";
