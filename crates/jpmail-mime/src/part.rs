//! Decoding of a single MIME body part.
//!
//! Transfer encoding is removed first; `text/*` parts are then transcoded
//! from their declared charset. Decoding is eager: a [`Part`] never holds
//! encoded bytes.

use crate::charset::Charset;
use crate::content_type::ContentType;
use crate::disposition::{ContentDisposition, DispositionKind};
use crate::encoding::decode_rfc2047;
use crate::error::Result;
use crate::header::Headers;
use crate::transfer::TransferEncoding;

/// Decoded content of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Body {
    /// Text of a `text/*` part.
    Text(String),
    /// Untouched bytes of any other media type.
    Binary(Vec<u8>),
}

/// A decoded body unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Part {
    /// Lowercased `type/subtype`.
    pub media_type: String,
    /// Declared charset, or `us-ascii` when absent.
    pub charset: String,
    /// Transfer encoding the body arrived in.
    pub transfer_encoding: TransferEncoding,
    /// Disposition type, if the part declared one.
    pub disposition: Option<DispositionKind>,
    /// Decoded filename from Content-Disposition or the Content-Type `name`.
    pub filename: Option<String>,
    /// Content-ID without its angle brackets.
    pub content_id: Option<String>,
    /// Decoded content.
    pub body: Body,
}

impl Part {
    /// Decodes one part from its headers and raw body.
    ///
    /// A missing Content-Type means `text/plain; charset=us-ascii`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContentType`, `UnsupportedEncoding`,
    /// `UnsupportedCharset` or a decode error for the body.
    pub fn decode(headers: &Headers, body: &[u8]) -> Result<Self> {
        let content_type = content_type_of(headers)?;
        Self::decode_as(&content_type, headers, body)
    }

    /// Decodes a part whose Content-Type is already parsed.
    pub(crate) fn decode_as(
        content_type: &ContentType,
        headers: &Headers,
        body: &[u8],
    ) -> Result<Self> {
        let transfer_encoding =
            TransferEncoding::parse(headers.get("content-transfer-encoding").unwrap_or_default())?;
        let disposition = headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
            .transpose()?;

        let filename = disposition
            .as_ref()
            .and_then(ContentDisposition::filename)
            .or_else(|| content_type.name())
            .map(decode_rfc2047)
            .transpose()?;
        let content_id = headers.get("content-id").map(strip_angle_brackets);

        let decoded = transfer_encoding.decode(body)?;
        let charset = content_type.charset().unwrap_or("us-ascii").to_string();
        let body = if content_type.is_text() {
            Body::Text(Charset::resolve(&charset)?.decode(&decoded)?)
        } else {
            Body::Binary(decoded)
        };

        Ok(Self {
            media_type: content_type.media_type(),
            charset,
            transfer_encoding,
            disposition: disposition.map(|d| d.kind),
            filename,
            content_id,
            body,
        })
    }

    /// Returns the decoded text of a `text/*` part.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            Body::Binary(_) => None,
        }
    }

    /// Returns the bytes of a non-text part.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Text(_) => None,
            Body::Binary(bytes) => Some(bytes),
        }
    }

    /// Checks for an explicit `Content-Disposition: attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition == Some(DispositionKind::Attachment)
    }
}

/// Parses the Content-Type of a header block, applying the default.
pub(crate) fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get("content-type")
        .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
}

fn strip_angle_brackets(id: &str) -> String {
    let id = id.trim();
    id.strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(id)
        .to_string()
}
