use transport::Envelope;

use crate::error::{CodecError, CodecResult};

/// Encoded payload plus the envelope that describes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub envelope: Envelope,
    pub payload: Vec<u8>,
}

impl Encoded {
    pub fn new(envelope: Envelope, payload: Vec<u8>) -> Self {
        Self { envelope, payload }
    }
}

/// Stateless converter between one wire representation and one domain type.
///
/// Implementations hold no state, so a single instance may be shared across
/// threads freely. Composite codecs delegate each nested type to that type's
/// own codec and prefix the nested error path with the field they were
/// decoding.
pub trait Codec: Send + Sync + 'static {
    type Wire;
    type Domain;

    fn decode(&self, wire: &Self::Wire) -> CodecResult<Self::Domain>;
    fn encode(&self, value: &Self::Domain) -> CodecResult<Self::Wire>;

    /// Absent in, absent out. Never substitutes a default.
    fn decode_opt(&self, wire: Option<&Self::Wire>) -> CodecResult<Option<Self::Domain>> {
        wire.map(|wire| self.decode(wire)).transpose()
    }

    /// Absent in, absent out. Never substitutes a default.
    fn encode_opt(&self, value: Option<&Self::Domain>) -> CodecResult<Option<Self::Wire>> {
        value.map(|value| self.encode(value)).transpose()
    }

    /// Decodes a repeated field in order, tagging failures with `field[idx]`.
    fn decode_seq(&self, field: &str, items: &[Self::Wire]) -> CodecResult<Vec<Self::Domain>>
    where
        Self::Wire: Sized,
    {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                self.decode(item)
                    .map_err(|err| err.within(format!("{field}[{idx}]")))
            })
            .collect()
    }

    /// Encodes a repeated field in order, tagging failures with `field[idx]`.
    fn encode_seq(&self, field: &str, items: &[Self::Domain]) -> CodecResult<Vec<Self::Wire>>
    where
        Self::Domain: Sized,
    {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                self.encode(item)
                    .map_err(|err: CodecError| err.within(format!("{field}[{idx}]")))
            })
            .collect()
    }
}
