//! Charset resolution and byte-to-text transcoding.
//!
//! Names are looked up case-insensitively in the `encoding_rs` label table,
//! a static registry that is never mutated. `CP932` is rewritten to
//! `Shift_JIS` first because iPhone mail labels Shift_JIS bodies that way.

use std::borrow::Cow;
use std::io::Read;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Labels decoded as strict 7-bit ASCII.
///
/// The WHATWG table maps these to windows-1252, which would accept every
/// byte and hide mislabeled 8-bit content.
const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "us",
    "iso646-us",
    "iso-ir-6",
    "ansi_x3.4-1968",
    "ansi_x3.4-1986",
    "cp367",
    "ibm367",
    "csascii",
    "646",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ascii,
    Registry(&'static Encoding),
}

/// A resolved charset able to decode bytes into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    kind: Kind,
}

impl Charset {
    /// The default charset of a text part without a `charset` parameter.
    pub const US_ASCII: Self = Self { kind: Kind::Ascii };

    /// Resolves a charset name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCharset`] if the name is not in the registry.
    pub fn resolve(name: &str) -> Result<Self> {
        let label = name.trim();
        let label = if label.eq_ignore_ascii_case("cp932") {
            tracing::debug!(charset = label, "treating CP932 as Shift_JIS");
            "shift_jis"
        } else {
            label
        };

        if ASCII_LABELS.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            return Ok(Self::US_ASCII);
        }

        Encoding::for_label_no_replacement(label.as_bytes())
            .map(|encoding| Self {
                kind: Kind::Registry(encoding),
            })
            .ok_or_else(|| Error::UnsupportedCharset(name.to_string()))
    }

    /// Returns the canonical name of the charset.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.kind {
            Kind::Ascii => "us-ascii",
            Kind::Registry(encoding) => encoding.name(),
        }
    }

    /// Decodes bytes into text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCharsetData`] on the first byte sequence that
    /// is invalid in this charset. Nothing is replaced or dropped.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self.kind {
            Kind::Ascii => {
                if !bytes.is_ascii() {
                    return Err(Error::InvalidCharsetData(self.name().to_string()));
                }
                Ok(bytes.iter().copied().map(char::from).collect())
            }
            Kind::Registry(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned)
                .ok_or_else(|| Error::InvalidCharsetData(self.name().to_string())),
        }
    }

    /// Drains a reader and decodes its bytes into text.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the bytes are invalid in this charset.
    pub fn decode_reader<R: Read>(&self, mut reader: R) -> Result<String> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.decode(&bytes)
    }
}
