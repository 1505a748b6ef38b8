//! Framing of raw message bytes into a header block and a body.

use crate::error::Result;
use crate::header::Headers;
use std::io::Read;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A message split into headers and undecoded body bytes.
#[derive(Debug, Clone, Default)]
pub struct RawMessage {
    /// Top-level header fields.
    pub headers: Headers,
    /// Body exactly as it follows the blank line.
    pub body: Vec<u8>,
}

impl RawMessage {
    /// Frames a message held in memory.
    ///
    /// A leading UTF-8 BOM and an mbox `From ` separator line are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedHeader`] if the header block does
    /// not frame.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let data = skip_envelope(data);
        let (headers, offset) = Headers::parse(data)?;
        Ok(Self {
            headers,
            body: data[offset..].to_vec(),
        })
    }

    /// Drains a reader and frames its contents.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if reading fails, otherwise as
    /// [`RawMessage::parse`].
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        tracing::trace!(bytes = data.len(), "read raw message");
        Self::parse(&data)
    }
}

fn skip_envelope(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}
