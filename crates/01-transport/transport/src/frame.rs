//! Length-delimited frame logs.
//!
//! Each frame is laid out as:
//!
//! ```text
//! +-----------+-----+-----+-----------+-----------------+
//! | len: u32  | tag | ver | flags:u16 | payload         |
//! +-----------+-----+-----+-----------+-----------------+
//! ```
//!
//! `len` is little-endian and counts everything after itself (header plus
//! payload). A stream that ends exactly on a frame boundary is a clean end of
//! log; anything else is a truncation.

use std::io::{self, Read, Write};

use crate::envelope::Envelope;
use crate::error::{FrameError, FrameResult};

/// Bytes occupied by the envelope portion of the frame header.
pub const FRAME_HEADER_LEN: usize = 4;
/// Upper bound on a single frame (header plus payload).
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// One decoded frame: the envelope plus its opaque payload bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub envelope: Envelope,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(envelope: Envelope, payload: Vec<u8>) -> Self {
        Self { envelope, payload }
    }

    /// Serializes the frame into a standalone buffer (length prefix included).
    pub fn to_bytes(&self) -> FrameResult<Vec<u8>> {
        let mut out = Vec::with_capacity(LEN_PREFIX + FRAME_HEADER_LEN + self.payload.len());
        FrameWriter::new(&mut out).write_frame(self.envelope, &self.payload)?;
        Ok(out)
    }

    /// Parses exactly one frame from `bytes`. Trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> FrameResult<Self> {
        let mut reader = FrameReader::new(bytes);
        let frame = reader.read_frame()?.ok_or(FrameError::Truncated {
            section: "header",
            expected: LEN_PREFIX,
            actual: 0,
        })?;
        let consumed = LEN_PREFIX + FRAME_HEADER_LEN + frame.payload.len();
        if consumed != bytes.len() {
            return Err(FrameError::BadLength {
                declared: bytes.len(),
            });
        }
        Ok(frame)
    }
}

/// Appends frames to an underlying writer.
pub struct FrameWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Writes a single frame. Oversized payloads are rejected before any byte is written.
    pub fn write_frame(&mut self, envelope: Envelope, payload: &[u8]) -> FrameResult<()> {
        let len = FRAME_HEADER_LEN + payload.len();
        if len > MAX_FRAME_LEN {
            return Err(FrameError::BadLength { declared: len });
        }
        let mut header = [0u8; LEN_PREFIX + FRAME_HEADER_LEN];
        header[..4].copy_from_slice(&(len as u32).to_le_bytes());
        header[4] = envelope.tag;
        header[5] = envelope.ver;
        header[6..8].copy_from_slice(&envelope.flags.to_le_bytes());
        self.inner.write_all(&header)?;
        self.inner.write_all(payload)?;
        self.written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> FrameResult<()> {
        self.inner.flush().map_err(FrameError::from)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads frames sequentially from an underlying reader.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next frame. Returns `Ok(None)` on a clean end of log.
    pub fn read_frame(&mut self) -> FrameResult<Option<Frame>> {
        let mut prefix = [0u8; LEN_PREFIX];
        let got = read_full(&mut self.inner, &mut prefix)?;
        if got == 0 {
            return Ok(None);
        }
        if got < LEN_PREFIX {
            return Err(FrameError::Truncated {
                section: "header",
                expected: LEN_PREFIX,
                actual: got,
            });
        }

        let len = u32::from_le_bytes(prefix) as usize;
        if !(FRAME_HEADER_LEN..=MAX_FRAME_LEN).contains(&len) {
            return Err(FrameError::BadLength { declared: len });
        }

        let mut header = [0u8; FRAME_HEADER_LEN];
        let got = read_full(&mut self.inner, &mut header)?;
        if got < FRAME_HEADER_LEN {
            return Err(FrameError::Truncated {
                section: "header",
                expected: FRAME_HEADER_LEN,
                actual: got,
            });
        }
        let envelope = Envelope::new(header[0], header[1])
            .with_flags(u16::from_le_bytes([header[2], header[3]]));

        let mut payload = vec![0u8; len - FRAME_HEADER_LEN];
        let got = read_full(&mut self.inner, &mut payload)?;
        if got < payload.len() {
            return Err(FrameError::Truncated {
                section: "payload",
                expected: payload.len(),
                actual: got,
            });
        }
        Ok(Some(Frame { envelope, payload }))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = FrameResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Like `read_exact`, but reports how many bytes were available before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> FrameResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}
