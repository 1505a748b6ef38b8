//! # jpmail-mime
//!
//! Decoding of Internet email into structured, Unicode-clean messages, with
//! first-class support for the legacy Japanese charsets (ISO-2022-JP,
//! Shift_JIS and its CP932 label, EUC-JP) that Japanese mailers still emit.
//!
//! ## Features
//!
//! - **Charsets**: case-insensitive resolution through the WHATWG registry,
//!   strict decoding that fails on invalid byte sequences
//! - **Transfer encodings**: 7bit, 8bit, quoted-printable and base64, with
//!   truncated base64 recovered instead of rejected
//! - **Headers**: RFC 2047 encoded words, RFC 2231 parameters, address lists
//!   with groups and encoded display names
//! - **Multipart**: mixed, related and alternative containers, recursively
//!
//! ## Quick Start
//!
//! ```
//! use jpmail_mime::assemble_message;
//!
//! let raw = b"From: =?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?= <test@example.jp>\r\n\
//!             To: user@example.com\r\n\
//!             Subject: =?UTF-8?B?44K044O844OV44Kh44O8?=\r\n\
//!             Content-Type: text/plain; charset=UTF-8\r\n\
//!             \r\n\
//!             Hello\r\n";
//!
//! let message = assemble_message(&raw[..])?;
//! assert_eq!(message.subject(), "ゴーファー");
//! assert_eq!(message.from().display_name, "テスト");
//! assert_eq!(message.body_text(), Some("Hello\r\n"));
//! # Ok::<(), jpmail_mime::Error>(())
//! ```
//!
//! ### Decoding Header Values
//!
//! ```
//! use jpmail_mime::{decode_header, parse_address_list};
//!
//! assert_eq!(decode_header("=?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?=")?, "テスト");
//!
//! let to = parse_address_list("Alice <alice@example.com>, bob@example.com")?;
//! assert_eq!(to[1].address, "bob@example.com");
//! # Ok::<(), jpmail_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod charset;
mod content_type;
mod disposition;
mod error;
mod header;
mod message;
mod multipart;
mod options;
mod part;
mod raw;
mod transfer;

pub mod encoding;

use std::io::Read;

pub use address::Address;
pub use charset::Charset;
pub use content_type::ContentType;
pub use disposition::{ContentDisposition, DispositionKind};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::Message;
pub use multipart::BodyKind;
pub use options::{DEFAULT_MAX_DEPTH, DecodeOptions};
pub use part::{Body, Part};
pub use raw::RawMessage;
pub use transfer::{TransferEncoding, decode_transfer};

/// Reads a message stream and splits it into headers and body bytes.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails or [`Error::MalformedHeader`] if
/// the header block does not frame.
pub fn read_message<R: Read>(reader: R) -> Result<RawMessage> {
    RawMessage::read(reader)
}

/// Parses a single mailbox such as `Name <user@example.com>`.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if the text is not exactly one mailbox.
pub fn parse_address(text: &str) -> Result<Address> {
    Address::parse(text)
}

/// Parses a comma-separated address list, flattening groups.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if any entry fails to parse or the list
/// is empty.
pub fn parse_address_list(text: &str) -> Result<Vec<Address>> {
    Address::parse_list(text)
}

/// Decodes the RFC 2047 encoded words in an arbitrary header value.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCharset`] or [`Error::InvalidCharsetData`] for
/// an encoded word whose charset cannot be decoded.
pub fn decode_header(text: &str) -> Result<String> {
    encoding::decode_rfc2047(text)
}

/// Decodes one body part from its headers and a body stream.
///
/// The stream is drained completely before decoding starts.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise any error of
/// [`Part::decode`].
pub fn decode_body<R: Read>(headers: &Headers, mut body: R) -> Result<Part> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)?;
    Part::decode(headers, &bytes)
}

/// Runs the full pipeline over a message stream with default options.
///
/// # Errors
///
/// Returns the first framing, header or body error encountered. Use
/// [`Error::is_header_error`] to tell sender and subject failures apart from
/// body failures.
pub fn assemble_message<R: Read>(reader: R) -> Result<Message> {
    assemble_message_with(reader, &DecodeOptions::default())
}

/// Runs the full pipeline over a message stream.
///
/// # Errors
///
/// As [`assemble_message`], plus [`Error::NestingTooDeep`] when multipart
/// nesting exceeds `options.max_depth`.
pub fn assemble_message_with<R: Read>(reader: R, options: &DecodeOptions) -> Result<Message> {
    let raw = RawMessage::read(reader)?;
    Message::assemble(&raw, options)
}
