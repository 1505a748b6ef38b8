//! Recursive structuring of `multipart/*` bodies.
//!
//! Every container call returns its own [`Contents`]; parents fold child
//! results in with [`Contents::merge`], whose rules depend on the container:
//! `multipart/alternative` chooses (a later text or html part replaces an
//! earlier one) while `mixed` and `related` compose (a second text or html
//! part is kept as an attachment).

use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::options::DecodeOptions;
use crate::part::{Part, content_type_of};
use std::collections::HashMap;

/// How a body is structured, resolved from its Content-Type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// Any non-multipart media type.
    SinglePart,
    /// `multipart/mixed` with its boundary.
    MultipartMixed(String),
    /// `multipart/related` with its boundary.
    MultipartRelated(String),
    /// `multipart/alternative` with its boundary.
    MultipartAlternative(String),
    /// Any other `multipart/*` media type.
    Unknown(String),
}

impl BodyKind {
    /// Resolves the body kind of a content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] for a supported multipart type
    /// without a boundary parameter.
    pub fn of(content_type: &ContentType) -> Result<Self> {
        if !content_type.is_multipart() {
            return Ok(Self::SinglePart);
        }
        let boundary = || {
            content_type
                .boundary()
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .ok_or(Error::MissingBoundary)
        };
        Ok(match content_type.sub_type.as_str() {
            "mixed" => Self::MultipartMixed(boundary()?),
            "related" => Self::MultipartRelated(boundary()?),
            "alternative" => Self::MultipartAlternative(boundary()?),
            _ => Self::Unknown(content_type.media_type()),
        })
    }
}

/// Container semantics applied while merging children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Mixed,
    Related,
    Alternative,
}

/// Partial message produced by one container or leaf.
#[derive(Debug, Default)]
pub(crate) struct Contents {
    pub text: Option<Part>,
    pub html: Option<Part>,
    pub resources: HashMap<String, Part>,
    pub attachments: HashMap<String, Part>,
    /// Attachments without a filename, named when the message is built.
    pub unnamed: Vec<Part>,
}

impl Contents {
    /// Places the sole body of a non-multipart message by media type.
    pub fn single(part: Part) -> Self {
        let mut contents = Self::default();
        match part.media_type.as_str() {
            "text/plain" => contents.text = Some(part),
            "text/html" => contents.html = Some(part),
            _ => contents.unnamed.push(part),
        }
        contents
    }

    /// Classifies a leaf part found inside `container`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFilename`] for an attachment without a name.
    pub fn leaf(part: Part, container: Container) -> Result<Self> {
        let mut contents = Self::default();

        if part.is_attachment() {
            let name = part.filename.clone().ok_or(Error::MissingFilename)?;
            contents.attachments.insert(name, part);
        } else if let (Container::Related, Some(id)) = (container, part.content_id.clone()) {
            contents.resources.insert(id, part);
        } else if let Some(name) = part.filename.clone() {
            contents.attachments.insert(name, part);
        } else {
            match part.media_type.as_str() {
                "text/plain" => contents.text = Some(part),
                "text/html" => contents.html = Some(part),
                _ => contents.unnamed.push(part),
            }
        }

        Ok(contents)
    }

    /// Folds a child's contents into this one under `container` rules.
    #[must_use]
    pub fn merge(mut self, other: Self, container: Container) -> Self {
        merge_body(&mut self.text, other.text, &mut self.unnamed, container);
        merge_body(&mut self.html, other.html, &mut self.unnamed, container);

        for (id, part) in other.resources {
            if self.resources.contains_key(&id) {
                tracing::debug!(content_id = %id, "duplicate Content-ID, keeping the later part");
            }
            self.resources.insert(id, part);
        }
        for (name, part) in other.attachments {
            let name = unique_name(&self.attachments, &name);
            self.attachments.insert(name, part);
        }
        self.unnamed.extend(other.unnamed);
        self
    }

    /// Assigns generated ordinal names (`part-1`, `part-2`, ...) to unnamed
    /// attachments, in document order.
    pub fn name_attachments(&mut self) {
        let mut ordinal = 0;
        for part in std::mem::take(&mut self.unnamed) {
            let name = loop {
                ordinal += 1;
                let candidate = format!("part-{ordinal}");
                if !self.attachments.contains_key(&candidate) {
                    break candidate;
                }
            };
            tracing::trace!(name = %name, media_type = %part.media_type, "named attachment");
            self.attachments.insert(name, part);
        }
    }
}

fn merge_body(
    current: &mut Option<Part>,
    incoming: Option<Part>,
    unnamed: &mut Vec<Part>,
    container: Container,
) {
    let Some(incoming) = incoming else {
        return;
    };
    if current.is_none() || container == Container::Alternative {
        *current = Some(incoming);
    } else {
        tracing::debug!(media_type = %incoming.media_type, "extra body part kept as attachment");
        unnamed.push(incoming);
    }
}

/// Returns `name`, or `name (2)`, `name (3)`, ... before the extension when
/// the name is taken.
fn unique_name(taken: &HashMap<String, Part>, name: &str) -> String {
    if !taken.contains_key(name) {
        return name.to_string();
    }
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    (2..)
        .map(|n| format!("{stem} ({n}){extension}"))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Structures the body of a multipart container.
///
/// `depth` counts this container; nesting beyond `options.max_depth` fails.
/// A failure in any child aborts the whole call. Returns the contents and
/// the offset just past the closing delimiter line, where the enclosing
/// container resumes its own scan.
///
/// # Errors
///
/// Returns [`Error::TruncatedMultipart`] if the closing delimiter is missing.
pub(crate) fn structure(
    container: Container,
    boundary: &str,
    body: &[u8],
    depth: usize,
    options: &DecodeOptions,
) -> Result<(Contents, usize)> {
    if depth > options.max_depth {
        return Err(Error::NestingTooDeep(options.max_depth));
    }

    let delimiter = format!("--{boundary}");
    let truncated =
        || Error::TruncatedMultipart(format!("no closing delimiter for boundary {boundary:?}"));

    // The preamble before the first delimiter is discarded.
    let mut open = find_delimiter(body, 0, delimiter.as_bytes()).ok_or_else(truncated)?;
    let mut contents = Contents::default();
    let mut index = 0;

    while !open.closing {
        let start = open.next;
        let next = find_delimiter(body, start, delimiter.as_bytes()).ok_or_else(truncated)?;
        let child = &body[start..entity_end(body, start, next.line_start)];
        let (headers, offset) = Headers::parse(child)?;
        let content_type = content_type_of(&headers)?;
        tracing::trace!(
            ?container,
            index,
            media_type = %content_type.media_type(),
            "multipart child"
        );

        let partial = match container_of(&content_type)? {
            None => {
                open = next;
                let part = Part::decode_as(&content_type, &headers, &child[offset..])?;
                Contents::leaf(part, container)?
            }
            // A nested container may reuse this boundary, so it scans the
            // rest of the body itself and this scan resumes after it.
            Some((inner, inner_boundary)) => {
                let body_start = start + offset;
                let (partial, consumed) =
                    structure(inner, &inner_boundary, &body[body_start..], depth + 1, options)?;
                open = find_delimiter(body, body_start + consumed, delimiter.as_bytes())
                    .ok_or_else(truncated)?;
                partial
            }
        };
        contents = contents.merge(partial, container);
        index += 1;
    }

    Ok((contents, open.next))
}

/// Dispatches an entity on its body kind: leaves go through `place`,
/// containers recurse one level deeper.
pub(crate) fn structure_entity(
    content_type: &ContentType,
    headers: &Headers,
    body: &[u8],
    depth: usize,
    options: &DecodeOptions,
    place: impl FnOnce(Part) -> Result<Contents>,
) -> Result<Contents> {
    match container_of(content_type)? {
        None => place(Part::decode_as(content_type, headers, body)?),
        Some((container, boundary)) => {
            structure(container, &boundary, body, depth + 1, options).map(|(contents, _)| contents)
        }
    }
}

/// Maps a body kind onto container semantics; `None` for a leaf.
fn container_of(content_type: &ContentType) -> Result<Option<(Container, String)>> {
    Ok(match BodyKind::of(content_type)? {
        BodyKind::SinglePart => None,
        BodyKind::MultipartMixed(boundary) => Some((Container::Mixed, boundary)),
        BodyKind::MultipartRelated(boundary) => Some((Container::Related, boundary)),
        BodyKind::MultipartAlternative(boundary) => Some((Container::Alternative, boundary)),
        BodyKind::Unknown(media_type) => return Err(Error::UnsupportedMultipart(media_type)),
    })
}

/// A delimiter line found in a multipart body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Delimiter {
    /// Offset of the first byte of the line.
    line_start: usize,
    /// Offset just past the line break.
    next: usize,
    /// Whether this is the closing `--boundary--` form.
    closing: bool,
}

/// Finds the first delimiter line at or after `from`, which must be the
/// start of a line. Trailing spaces and tabs after the boundary are allowed.
fn find_delimiter(body: &[u8], from: usize, delimiter: &[u8]) -> Option<Delimiter> {
    let mut offset = from;

    while offset < body.len() {
        let line_start = offset;
        let next = body[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |pos| offset + pos + 1);
        offset = next;

        let line = &body[line_start..next];
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let Some(rest) = line.strip_prefix(delimiter) else {
            continue;
        };
        let (closing, tail) = match rest.strip_prefix(b"--") {
            Some(tail) => (true, tail),
            None => (false, rest),
        };
        if tail.iter().all(|b| matches!(b, b' ' | b'\t')) {
            return Some(Delimiter {
                line_start,
                next,
                closing,
            });
        }
    }

    None
}

/// End of an entity that starts at `start`; the line break before the
/// delimiter line at `line_start` belongs to the delimiter.
fn entity_end(body: &[u8], start: usize, line_start: usize) -> usize {
    let mut end = line_start;
    if end > start {
        end -= 1; // '\n'
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}
