//! Content-Type parsing (RFC 2045).
//!
//! The parameter grammar (`; key=value`, quoted strings, RFC 2231
//! extended and continued values) is shared with `Content-Disposition`.

use crate::charset::Charset;
use crate::encoding::decode_percent;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// A parsed Content-Type value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Top-level type, lowercased (`text`, `image`, `multipart`, ...).
    pub main_type: String,
    /// Subtype, lowercased.
    pub sub_type: String,
    /// Parameters with lowercased keys and decoded values.
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// The implicit type of a part without a Content-Type header:
    /// `text/plain; charset=us-ascii`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self {
            main_type: "text".to_string(),
            sub_type: "plain".to_string(),
            parameters: HashMap::from([("charset".to_string(), "us-ascii".to_string())]),
        }
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn media_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Declared charset of a text part.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// Delimiter of a multipart body.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary")
    }

    /// Returns the legacy `name` parameter some mailers use for filenames.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.param("name")
    }

    /// Checks for a `multipart/*` type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Checks for a `text/*` type, the only kind transcoded to text.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type == "text"
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Parses a Content-Type value such as
    /// `text/plain; charset="ISO-2022-JP"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedContentType`] unless the value is a
    /// `type/subtype` pair of tokens followed by well-formed parameters.
    pub fn parse(s: &str) -> Result<Self> {
        let (value, parameters) = parse_header_value(s)?;

        let (main_type, sub_type) = value
            .split_once('/')
            .ok_or_else(|| Error::MalformedContentType(format!("missing subtype in {s:?}")))?;
        let main_type = main_type.trim();
        let sub_type = sub_type.trim();
        if !is_token(main_type) || !is_token(sub_type) {
            return Err(Error::MalformedContentType(format!(
                "invalid media type in {s:?}"
            )));
        }

        Ok(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            parameters,
        })
    }
}

/// Characters that may not appear in an RFC 2045 token.
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii() && !c.is_ascii_control() && c != ' ' && !TSPECIALS.contains(c))
}

/// One `key*N*=value` piece of an RFC 2231 parameter.
struct Piece {
    index: u32,
    extended: bool,
    value: String,
}

/// Splits a structured header value into its leading value and parameters.
///
/// Parameter names are lowercased. RFC 2231 continuations are joined and
/// extended values decoded through their declared charset.
pub(crate) fn parse_header_value(s: &str) -> Result<(&str, HashMap<String, String>)> {
    let malformed = |what: &str| Error::MalformedContentType(format!("{what} in {s:?}"));

    let (value, mut rest) = s.split_once(';').unwrap_or((s, ""));
    let value = value.trim();
    if value.is_empty() {
        return Err(malformed("empty value"));
    }

    let mut parameters = HashMap::new();
    let mut pieces: HashMap<String, Vec<Piece>> = HashMap::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let (key, after_key) = rest
            .split_once('=')
            .ok_or_else(|| malformed("parameter without value"))?;
        let key = key.trim().to_ascii_lowercase();
        if !is_token(&key) {
            return Err(malformed("invalid parameter name"));
        }

        let after_key = after_key.trim_start();
        let (param_value, remaining) = if let Some(quoted) = after_key.strip_prefix('"') {
            read_quoted(quoted).ok_or_else(|| malformed("unterminated quoted string"))?
        } else {
            let end = after_key.find(';').unwrap_or(after_key.len());
            (after_key[..end].trim().to_string(), &after_key[end..])
        };
        rest = remaining;

        if let Some((name, index, extended)) = split_section(&key) {
            pieces.entry(name.to_string()).or_default().push(Piece {
                index,
                extended,
                value: param_value,
            });
        } else {
            parameters.insert(key, param_value);
        }
    }

    for (name, mut parts) in pieces {
        parts.sort_by_key(|piece| piece.index);
        parameters.insert(name, join_pieces(&parts)?);
    }

    Ok((value, parameters))
}

/// Reads a quoted string body (after the opening quote), unescaping `\x`.
fn read_quoted(s: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => value.push(chars.next()?.1),
            '"' => return Some((value, &s[i + 1..])),
            _ => value.push(c),
        }
    }
    None
}

/// Splits `name*`, `name*N` and `name*N*` into (name, index, extended).
fn split_section(key: &str) -> Option<(&str, u32, bool)> {
    let (name, section) = key.split_once('*')?;
    if section.is_empty() {
        return Some((name, 0, true));
    }
    let (index, extended) = match section.strip_suffix('*') {
        Some(index) => (index, true),
        None => (section, false),
    };
    Some((name, index.parse().ok()?, extended))
}

fn join_pieces(pieces: &[Piece]) -> Result<String> {
    let mut charset = None;
    let mut bytes = Vec::new();

    for (i, piece) in pieces.iter().enumerate() {
        if !piece.extended {
            bytes.extend_from_slice(piece.value.as_bytes());
            continue;
        }
        let mut data = piece.value.as_str();
        if i == 0 {
            // charset'language'percent-encoded
            let mut fields = data.splitn(3, '\'');
            if let (Some(cs), Some(_language), Some(encoded)) =
                (fields.next(), fields.next(), fields.next())
            {
                charset = Some(cs);
                data = encoded;
            }
        }
        bytes.extend(decode_percent(data)?);
    }

    match charset {
        Some(name) if !name.is_empty() => Charset::resolve(name)?.decode(&bytes),
        _ => Charset::resolve("utf-8")?.decode(&bytes),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_plain_default() {
        let ct = ContentType::text_plain();
        assert_eq!(ct.media_type(), "text/plain");
        assert_eq!(ct.charset(), Some("us-ascii"));
        assert!(ct.is_text());
        assert!(!ct.is_multipart());
    }

    #[test]
    fn test_parse_lowercases_type_not_values() {
        let ct = ContentType::parse("Text/Plain; Charset=ISO-2022-JP").unwrap();
        assert_eq!(ct.media_type(), "text/plain");
        assert_eq!(ct.charset(), Some("ISO-2022-JP"));
    }

    #[test]
    fn test_parse_quoted_boundary() {
        let ct = ContentType::parse("Multipart/Alternative; boundary=\"----=_Part_123; x\"").unwrap();
        assert_eq!(ct.sub_type, "alternative");
        assert_eq!(ct.boundary(), Some("----=_Part_123; x"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_parse_escaped_quote() {
        let ct = ContentType::parse(r#"application/pdf; name="a \"b\".pdf""#).unwrap();
        assert_eq!(ct.name(), Some("a \"b\".pdf"));
    }

    #[test]
    fn test_parse_trailing_semicolon() {
        let ct = ContentType::parse("text/html; charset=utf-8;").unwrap();
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.parameters.len(), 1);
    }

    #[test]
    fn test_parse_malformed() {
        for input in [
            "",
            "text",
            "text/",
            "/plain",
            "te xt/plain",
            "text/plain; charset",
            "text/plain; name=\"open",
        ] {
            assert!(
                matches!(ContentType::parse(input), Err(Error::MalformedContentType(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rfc2231_extended_value() {
        let ct = ContentType::parse(
            "application/octet-stream; name*=UTF-8''%E3%83%86%E3%82%B9%E3%83%88.txt",
        )
        .unwrap();
        assert_eq!(ct.name(), Some("テスト.txt"));
    }

    #[test]
    fn test_rfc2231_continuations() {
        let ct = ContentType::parse(
            "application/octet-stream; name*0*=shift_jis'ja'%83e%83X; name*1*=%83g; name*2=.txt",
        )
        .unwrap();
        assert_eq!(ct.name(), Some("テスト.txt"));
    }
}
