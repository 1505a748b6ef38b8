//! Header block framing and lookup.

use crate::error::{Error, Result};

/// Header fields of a message or body part, in the order they appeared.
///
/// Lookup is case-insensitive; a field name may occur several times.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Gets the first value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).next()
    }

    /// Gets every value of a field in document order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.values(name).collect()
    }

    /// Iterates over `(name, value)` pairs as they appeared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Checks whether the block has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn values(&self, name: &str) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Frames the header block at the start of `bytes`.
    ///
    /// Folded lines are joined with a single space. Lines may end in CRLF or
    /// LF. Framing stops at the first empty line; the returned offset is
    /// where the body starts, or the input length when there is no body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] for a line that is neither a
    /// `Name: value` field nor a continuation of one.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut offset = 0;

        for raw_line in bytes.split_inclusive(|&b| b == b'\n') {
            offset += raw_line.len();
            let line = decode_line(raw_line);
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                return Ok((Self { fields }, offset));
            }

            if line.starts_with([' ', '\t']) {
                let (_, value) = fields
                    .last_mut()
                    .ok_or_else(|| Error::MalformedHeader(line.to_string()))?;
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::MalformedHeader(line.to_string()));
            };
            let name = name.trim_end();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Error::MalformedHeader(line.to_string()));
            }
            fields.push((name.to_string(), value.trim().to_string()));
        }

        Ok((Self { fields }, bytes.len()))
    }
}

/// Headers should be ASCII; stray 8-bit bytes are read as UTF-8, falling
/// back to windows-1252, which maps every byte.
fn decode_line(bytes: &[u8]) -> String {
    std::str::from_utf8(bytes).map_or_else(
        |_| encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        str::to_string,
    )
}
