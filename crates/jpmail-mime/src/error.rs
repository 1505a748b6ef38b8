//! Error types for message decoding.

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoding error types.
///
/// Every variant describes malformed or unsupported input; none of them is
/// transient, so retrying the same bytes yields the same error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error while draining an input stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A header line could not be framed.
    #[error("Malformed header line: {0}")]
    MalformedHeader(String),

    /// Charset name absent from the registry.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// Bytes that are not valid in the declared charset.
    #[error("Invalid byte sequence for charset {0}")]
    InvalidCharsetData(String),

    /// Content-Transfer-Encoding other than 7bit, 8bit, base64 or quoted-printable.
    #[error("Unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    /// Invalid escape inside an encoded body or parameter.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 body with a byte outside the alphabet or misplaced padding.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Content-Type (or Content-Disposition) that does not parse.
    #[error("Malformed content type: {0}")]
    MalformedContentType(String),

    /// Multipart body without a boundary parameter.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// A `multipart/*` subtype with no structuring rule.
    #[error("Unsupported multipart type: {0}")]
    UnsupportedMultipart(String),

    /// Multipart body whose closing delimiter never appears.
    #[error("Truncated multipart body: {0}")]
    TruncatedMultipart(String),

    /// Multipart containers nested deeper than the configured limit.
    #[error("Multipart nesting exceeds depth {0}")]
    NestingTooDeep(usize),

    /// Attachment disposition with no derivable filename.
    #[error("Attachment part has no filename")]
    MissingFilename,

    /// Unparsable sender or recipient address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A non-address header that failed to decode.
    #[error("Failed to decode {field} header: {source}")]
    Header {
        /// Header field name.
        field: String,
        /// Underlying decode failure.
        source: Box<Error>,
    },
}

impl Error {
    /// Returns true for failures in the sender, recipient or subject headers.
    ///
    /// Callers can render a message with placeholder header values on these
    /// while still treating body failures as fatal.
    #[must_use]
    pub const fn is_header_error(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::Header { .. })
    }
}
