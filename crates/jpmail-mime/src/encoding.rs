//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 header encoding and the
//! percent escapes of RFC 2231 parameter values.

use crate::charset::Charset;
use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::fmt::Write as _;

/// Decoder that accepts missing padding and non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// Line breaks and other whitespace are skipped. Padding closes a quantum,
/// and symbols after it start a new one, so concatenated padded chunks
/// decode in full. Bytes after the final padding are ignored as long as
/// none of them is a Base64 symbol. A body truncated in the middle of its
/// final quantum yields every byte the remaining symbols still carry.
///
/// # Errors
///
/// Returns [`Error::Base64Decode`] for a byte outside the alphabet, a
/// symbol following trailing garbage, or padding that does not close its
/// quantum.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 4 * 3);
    let mut symbols: Vec<u8> = Vec::new();
    let mut padding = 0;
    let mut trailer = false;

    for (offset, &byte) in data.iter().enumerate() {
        if matches!(byte, b'\r' | b'\n' | b' ' | b'\t') {
            continue;
        }
        let symbol = is_base64_symbol(byte);
        if trailer {
            if symbol {
                return Err(base64::DecodeError::InvalidByte(offset, byte).into());
            }
        } else if byte == b'=' {
            padding += 1;
        } else if symbol {
            if padding > 0 {
                check_padding(symbols.len(), padding, false)?;
                LENIENT.decode_vec(&symbols, &mut out)?;
                symbols.clear();
                padding = 0;
            }
            symbols.push(byte);
        } else if padding > 0 {
            trailer = true;
        } else {
            return Err(base64::DecodeError::InvalidByte(offset, byte).into());
        }
    }

    if padding > 0 {
        check_padding(symbols.len(), padding, true)?;
    } else if symbols.len() % 4 != 0 {
        tracing::debug!(
            symbols = symbols.len(),
            "base64 data ends mid-quantum, decoding available prefix"
        );
        // A single symbol carries only six bits, not enough for a byte.
        if symbols.len() % 4 == 1 {
            symbols.pop();
        }
    }

    LENIENT.decode_vec(&symbols, &mut out)?;
    Ok(out)
}

const fn is_base64_symbol(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/'
}

/// Padding must complete the quantum it closes. The final quantum may have
/// lost some of its `=` to truncation.
fn check_padding(symbols: usize, padding: usize, at_end: bool) -> Result<()> {
    let needed = match symbols % 4 {
        2 => 2,
        3 => 1,
        _ => 0,
    };
    if needed > 0 && (padding == needed || (at_end && padding < needed)) {
        Ok(())
    } else {
        Err(base64::DecodeError::InvalidPadding.into())
    }
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes bytes using Quoted-Printable encoding (RFC 2045).
///
/// Encodes bytes that are not printable ASCII or would interfere
/// with email transmission.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for (i, byte) in data.iter().enumerate() {
        // Check if we need soft line break
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(char::from(*byte));
                line_length += 1;
            }
            // A space must not end an encoded line or it is lost as padding.
            b' ' => {
                if i + 1 == data.len() || line_length + 1 >= MAX_LINE_LENGTH - 3 {
                    result.push_str("=20");
                    line_length += 3;
                } else {
                    result.push(' ');
                    line_length += 1;
                }
            }
            _ => {
                let _ = write!(result, "={byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed and trailing whitespace added in transport
/// is stripped. Hard line breaks keep their original CRLF or LF form. An
/// `=` that is not followed by two hex digits passes through unchanged, as
/// unescaped URLs are common in quoted-printable bodies.
///
/// # Errors
///
/// Never fails; the `Result` matches [`decode_base64`].
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut lines = data.split(|&b| b == b'\n').peekable();

    while let Some(line) = lines.next() {
        let has_newline = lines.peek().is_some();
        let (line, crlf) = match line.strip_suffix(b"\r") {
            Some(stripped) if has_newline => (stripped, true),
            _ => (line, false),
        };
        let line = trim_trailing_whitespace(line);
        let (line, soft_break) = match line.strip_suffix(b"=") {
            Some(stripped) => (stripped, true),
            None => (line, false),
        };

        unescape_qp(line, &mut result);

        if has_newline && !soft_break {
            if crlf {
                result.extend_from_slice(b"\r\n");
            } else {
                result.push(b'\n');
            }
        }
    }

    Ok(result)
}

fn trim_trailing_whitespace(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\t'))
        .map_or(0, |pos| pos + 1);
    &line[..end]
}

/// An `=` that does not start a valid escape is kept as a literal character.
fn unescape_qp(line: &[u8], out: &mut Vec<u8>) {
    let mut rest = line;
    while let Some((&byte, tail)) = rest.split_first() {
        if let [b'=', hi, lo, after @ ..] = rest
            && let Some(escaped) = hex_pair(*hi, *lo)
        {
            out.push(escaped);
            rest = after;
            continue;
        }
        out.push(byte);
        rest = tail;
    }
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = char::from(hi).to_digit(16)?;
    let lo = char::from(lo).to_digit(16)?;
    u8::try_from((hi << 4) | lo).ok()
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?encoding?encoded-text?=`
///
/// # Arguments
///
/// * `text` - Text to encode
/// * `charset` - Character set (e.g., "utf-8")
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    // Only encode if necessary (contains non-ASCII)
    if text.chars().all(|c| c.is_ascii() && c != '=' && c != '?') {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped. Words that are
/// syntactically malformed are kept literally.
///
/// # Errors
///
/// Returns an error if a word names an unsupported charset or its bytes are
/// invalid in that charset.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut remaining = text;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        if let Some(word) = EncodedWord::parse(after_start) {
            let charset = Charset::resolve(word.charset)?;
            result.push_str(&charset.decode(&word.bytes)?);
            remaining = &after_start[word.consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_start;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    Ok(result)
}

/// One encoded word with its payload already transfer-decoded.
struct EncodedWord<'a> {
    charset: &'a str,
    bytes: Vec<u8>,
    /// Bytes consumed after the opening `=?`.
    consumed: usize,
}

impl<'a> EncodedWord<'a> {
    fn parse(s: &'a str) -> Option<Self> {
        let (charset, rest) = s.split_once('?')?;
        let (encoding, rest) = rest.split_once('?')?;
        let end = rest.find("?=")?;
        let encoded_text = &rest[..end];

        if charset.is_empty() || encoded_text.contains(char::is_whitespace) {
            return None;
        }
        // RFC 2231 allows a language suffix: charset*lang
        let charset = charset.split_once('*').map_or(charset, |(cs, _)| cs);

        let bytes = match encoding {
            "B" | "b" => LENIENT.decode(encoded_text.trim_end_matches('=')).ok()?,
            "Q" | "q" => decode_q(encoded_text)?,
            _ => return None,
        };

        let consumed = s.len() - rest.len() + end + 2;
        Some(Self {
            charset,
            bytes,
            consumed,
        })
    }
}

/// Decodes the Q encoding of RFC 2047 (`_` is a space).
fn decode_q(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(byte) = bytes.next() {
        match byte {
            b'_' => out.push(b' '),
            b'=' => out.push(hex_pair(bytes.next()?, bytes.next()?)?),
            _ => out.push(byte),
        }
    }
    Some(out)
}

/// Decodes `%XX` escapes of an RFC 2231 extended parameter value.
///
/// # Errors
///
/// Returns an error on a truncated or non-hex escape.
pub fn decode_percent(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(byte) = bytes.next() {
        if byte == b'%' {
            let escaped = match (bytes.next(), bytes.next()) {
                (Some(hi), Some(lo)) => hex_pair(hi, lo),
                _ => None,
            };
            out.push(escaped.ok_or_else(|| {
                Error::InvalidEncoding(format!("Invalid percent escape in {text:?}"))
            })?);
        } else {
            out.push(byte);
        }
    }
    Ok(out)
}
