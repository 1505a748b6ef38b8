//! Content-Disposition handling (RFC 2183).

use crate::content_type::parse_header_value;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Presentation requested for a body part.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DispositionKind {
    /// Displayed as part of the message.
    Inline,
    /// Offered as a separate download.
    Attachment,
    /// Any other disposition token, lowercased.
    Other(String),
}

/// Parsed Content-Disposition header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type.
    pub kind: DispositionKind,
    /// Parameters such as `filename`, keys lowercased.
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a Content-Disposition value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedContentType`] if the value does not parse.
    pub fn parse(s: &str) -> Result<Self> {
        let (value, parameters) = parse_header_value(s)?;
        if value.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(Error::MalformedContentType(format!(
                "invalid disposition type in {s:?}"
            )));
        }

        let kind = match value.to_ascii_lowercase().as_str() {
            "inline" => DispositionKind::Inline,
            "attachment" => DispositionKind::Attachment,
            other => DispositionKind::Other(other.to_string()),
        };

        Ok(Self { kind, parameters })
    }

    /// Returns the `filename` parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }

    /// Checks for an explicit attachment disposition.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == DispositionKind::Attachment
    }
}
