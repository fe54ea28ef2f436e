//! Error types for the streaming reader and writer.

use core::fmt::{self, Display};

use crate::scope::{DepthExceeded, ScopeViolation};

/// Error produced by [`JsonReader`](crate::JsonReader) and [`JsonWriter`](crate::JsonWriter).
#[derive(Debug)]
pub struct StreamError {
    /// The specific kind of error
    pub kind: StreamErrorKind,
    /// Byte offset into the input where the error was detected (reader only)
    pub offset: Option<usize>,
    /// 1-based line and column of `offset`, when known
    pub location: Option<(usize, usize)>,
}

impl Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some((line, column)) = self.location {
            write!(f, " at line {line} column {column}")?;
        }
        Ok(())
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            StreamErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl StreamError {
    /// Create an error without position information
    pub const fn without_offset(kind: StreamErrorKind) -> Self {
        StreamError {
            kind,
            offset: None,
            location: None,
        }
    }

    /// Create an error at `offset` into `input`, computing line and column.
    pub fn at(kind: StreamErrorKind, input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        StreamError {
            kind,
            offset: Some(offset),
            location: Some((line, offset - line_start + 1)),
        }
    }

    /// True if the input ended before a complete value was read.
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, StreamErrorKind::UnexpectedEof { .. })
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        StreamError::without_offset(StreamErrorKind::Io(e))
    }
}

/// Specific error kinds for streaming operations
#[derive(Debug)]
pub enum StreamErrorKind {
    /// A well-formed token appeared where the grammar does not allow it
    UnexpectedToken {
        /// The token that was found
        got: String,
        /// What was expected instead
        expected: &'static str,
    },
    /// A character that cannot start any token
    UnexpectedChar(char),
    /// Input ended early
    UnexpectedEof {
        /// What was expected before the end of input
        expected: &'static str,
    },
    /// An operation is not legal in the current nesting scope
    Nesting(ScopeViolation),
    /// Arrays and objects nested past the reader's limit
    TooDeep(DepthExceeded),
    /// Number text that does not follow the JSON number grammar, or does not fit
    InvalidNumber {
        /// The offending text
        text: String,
        /// The requested numeric type
        target: &'static str,
    },
    /// NaN or infinity written or read while not lenient
    NonFinite(f64),
    /// Malformed escape sequence in a string
    InvalidEscape,
    /// Underlying sink failed
    Io(std::io::Error),
}

impl Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamErrorKind::UnexpectedToken { got, expected } => {
                write!(f, "unexpected token: got {got}, expected {expected}")
            }
            StreamErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            StreamErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            StreamErrorKind::Nesting(v) => write!(f, "{v}"),
            StreamErrorKind::TooDeep(d) => write!(f, "{d}"),
            StreamErrorKind::InvalidNumber { text, target } => {
                write!(f, "invalid number `{text}` for {target}")
            }
            StreamErrorKind::NonFinite(v) => {
                write!(f, "numeric values must be finite, but was {v}")
            }
            StreamErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            StreamErrorKind::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl StreamErrorKind {
    /// Get an error code for this kind of error.
    pub const fn code(&self) -> &'static str {
        match self {
            StreamErrorKind::UnexpectedToken { .. } => "stream::unexpected_token",
            StreamErrorKind::UnexpectedChar(_) => "stream::unexpected_char",
            StreamErrorKind::UnexpectedEof { .. } => "stream::unexpected_eof",
            StreamErrorKind::Nesting(_) => "stream::nesting",
            StreamErrorKind::TooDeep(_) => "stream::too_deep",
            StreamErrorKind::InvalidNumber { .. } => "stream::invalid_number",
            StreamErrorKind::NonFinite(_) => "stream::non_finite",
            StreamErrorKind::InvalidEscape => "stream::invalid_escape",
            StreamErrorKind::Io(_) => "stream::io",
        }
    }
}

/// Result type for streaming operations
pub type Result<T, E = StreamError> = core::result::Result<T, E>;
