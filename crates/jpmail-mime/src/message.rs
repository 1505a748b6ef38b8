//! Fully decoded message and its assembly from raw bytes.

use crate::address::Address;
use crate::encoding::decode_rfc2047;
use crate::error::{Error, Result};
use crate::multipart::{Contents, structure_entity};
use crate::options::DecodeOptions;
use crate::part::{Part, content_type_of};
use crate::raw::RawMessage;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

/// A decoded email message.
///
/// Built once by [`Message::assemble`]; every part is already free of
/// transfer and charset encoding.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Message {
    date: Option<DateTime<FixedOffset>>,
    from: Address,
    to: Vec<Address>,
    subject: String,
    text: Option<Part>,
    html: Option<Part>,
    resources: HashMap<String, Part>,
    attachments: HashMap<String, Part>,
}

impl Message {
    /// Assembles a message from its framed headers and body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddress` for an unparsable From (or a non-empty,
    /// unparsable To), `Header` for an undecodable Subject, and any body
    /// error. A failure anywhere in the body aborts the whole message.
    pub fn assemble(raw: &RawMessage, options: &DecodeOptions) -> Result<Self> {
        let headers = &raw.headers;

        let from = Address::parse(headers.get("from").unwrap_or_default())?;
        let to = match headers.get_all("to").join(", ").trim() {
            "" => Vec::new(),
            list => Address::parse_list(list)?,
        };
        let subject = headers
            .get("subject")
            .map(decode_rfc2047)
            .transpose()
            .map_err(|e| Error::Header {
                field: "Subject".to_string(),
                source: Box::new(e),
            })?
            .unwrap_or_default();
        let date = headers.get("date").and_then(parse_date);

        let content_type = content_type_of(headers)?;
        let mut contents = structure_entity(&content_type, headers, &raw.body, 0, options, |part| {
            Ok(Contents::single(part))
        })?;
        contents.name_attachments();

        tracing::debug!(
            media_type = %content_type.media_type(),
            has_text = contents.text.is_some(),
            has_html = contents.html.is_some(),
            resources = contents.resources.len(),
            attachments = contents.attachments.len(),
            "assembled message"
        );

        Ok(Self {
            date,
            from,
            to,
            subject,
            text: contents.text,
            html: contents.html,
            resources: contents.resources,
            attachments: contents.attachments,
        })
    }

    /// Gets the Date header, if it parsed.
    #[must_use]
    pub const fn date(&self) -> Option<&DateTime<FixedOffset>> {
        self.date.as_ref()
    }

    /// Gets the sender.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Gets the recipients in header order.
    #[must_use]
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// Gets the decoded subject (empty when absent).
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Gets the plain-text body part.
    #[must_use]
    pub const fn text(&self) -> Option<&Part> {
        self.text.as_ref()
    }

    /// Gets the HTML body part.
    #[must_use]
    pub const fn html(&self) -> Option<&Part> {
        self.html.as_ref()
    }

    /// Gets the decoded plain-text body.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.text.as_ref().and_then(Part::text)
    }

    /// Gets the decoded HTML body.
    #[must_use]
    pub fn body_html(&self) -> Option<&str> {
        self.html.as_ref().and_then(Part::text)
    }

    /// Gets inline resources keyed by Content-ID (without angle brackets).
    #[must_use]
    pub const fn resources(&self) -> &HashMap<String, Part> {
        &self.resources
    }

    /// Gets attachments keyed by filename or generated `part-N` name.
    #[must_use]
    pub const fn attachments(&self) -> &HashMap<String, Part> {
        &self.attachments
    }
}

/// Parses an RFC 5322 date, tolerating a trailing comment and a weekday
/// that does not match the date.
fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let mut date = value.trim();
    if date.ends_with(')') {
        if let Some(open) = date.rfind('(') {
            date = date[..open].trim_end();
        }
    }

    let parsed = DateTime::parse_from_rfc2822(date).or_else(|err| {
        // Some mailers compute the weekday wrong; drop it and retry.
        match date.split_once(',') {
            Some((_, rest)) => DateTime::parse_from_rfc2822(rest.trim()),
            None => Err(err),
        }
    });

    match parsed {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(date = value, error = %err, "unparsable Date header");
            None
        }
    }
}
