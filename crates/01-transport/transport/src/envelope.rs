/// Header describing a serialized payload.
///
/// The envelope allows consumers to identify the serialized type (`tag`),
/// enforce schema compatibility (`ver`), and carry lightweight bitflags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Envelope {
    /// Message-type discriminant used to select the rkyv schema.
    pub tag: u8,
    /// Schema epoch associated with this payload.
    pub ver: u8,
    /// Reserved bitflags that travel with the payload.
    pub flags: u16,
}

impl Envelope {
    /// Constructs an envelope with the given tag and schema version.
    pub const fn new(tag: u8, ver: u8) -> Self {
        Self { tag, ver, flags: 0 }
    }

    /// Returns a copy of the envelope carrying `flags`.
    pub const fn with_flags(self, flags: u16) -> Self {
        Self { flags, ..self }
    }
}
