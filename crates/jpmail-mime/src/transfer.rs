//! Content-Transfer-Encoding removal.

use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use std::fmt;
use std::io::Read;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TransferEncoding {
    /// 7-bit ASCII, also assumed when the header is absent.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "7bit"))]
    SevenBit,
    /// 8-bit data.
    #[cfg_attr(feature = "serde", serde(rename = "8bit"))]
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses a Content-Transfer-Encoding value, ignoring case.
    ///
    /// An empty value means `7bit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] for any other mechanism.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "7bit" => Ok(Self::SevenBit),
            "8bit" => Ok(Self::EightBit),
            "base64" => Ok(Self::Base64),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            _ => Err(Error::UnsupportedEncoding(s.trim().to_string())),
        }
    }

    /// Removes this transfer encoding from a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Base64Decode`] if a base64 body is corrupt beyond a
    /// truncated final quantum.
    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::SevenBit | Self::EightBit => Ok(body.to_vec()),
            Self::Base64 => decode_base64(body),
            Self::QuotedPrintable => decode_quoted_printable(body),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// Drains a body stream and removes the named transfer encoding.
///
/// `None` stands for an absent Content-Transfer-Encoding header.
///
/// # Errors
///
/// Returns [`Error::UnsupportedEncoding`] for an unknown mechanism, or an
/// error from reading or decoding the body.
pub fn decode_transfer<R: Read>(encoding: Option<&str>, mut body: R) -> Result<Vec<u8>> {
    let encoding = TransferEncoding::parse(encoding.unwrap_or_default())?;
    let mut raw = Vec::new();
    body.read_to_end(&mut raw)?;
    encoding.decode(&raw)
}
