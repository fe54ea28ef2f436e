//! Error type for codec resolution, encoding and decoding.

use core::fmt::{self, Display};

use bindery_stream::{StreamError, StreamErrorKind};

/// Error returned by registry and codec operations.
#[derive(Debug)]
pub struct Error {
    /// The specific kind of error
    pub kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Syntax(e) => Some(e),
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// Wrap an error kind.
    pub const fn new(kind: ErrorKind) -> Self {
        Error { kind }
    }

    pub(crate) fn unsupported(type_name: impl Into<String>) -> Self {
        Error::new(ErrorKind::UnsupportedType {
            type_name: type_name.into(),
        })
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        })
    }

    /// Stable identifier for the kind of this error.
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { kind }
    }
}

impl From<StreamError> for Error {
    fn from(e: StreamError) -> Self {
        match e.kind {
            StreamErrorKind::Io(io) => Error::new(ErrorKind::Io(io)),
            _ => Error::new(ErrorKind::Syntax(e)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(e))
    }
}

/// Specific error kinds
#[derive(Debug)]
pub enum ErrorKind {
    /// No registered factory produced a codec for the type
    UnsupportedType {
        /// Display name of the requested type
        type_name: String,
    },
    /// Two members of one record hierarchy map to the same wire name
    DuplicateWireName {
        /// The record whose binding table was being built
        type_name: String,
        /// The contested wire name
        name: String,
    },
    /// A strict float codec was asked to encode NaN or an infinity
    InvalidNumericValue {
        /// The rejected value
        value: f64,
    },
    /// Malformed input, or an output call sequence that breaks nesting
    Syntax(StreamError),
    /// The underlying sink or source failed
    Io(std::io::Error),
    /// A value did not have the type its codec handles
    TypeMismatch {
        /// What the codec expected
        expected: String,
        /// What it got
        got: String,
    },
    /// A null where the target cannot represent absence
    UnexpectedNull {
        /// The type being decoded
        expected: String,
    },
    /// A number that does not fit the target integer type
    NumberOutOfRange {
        /// The numeric value that was out of range
        value: String,
        /// The target type that couldn't hold the value
        target_type: &'static str,
    },
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnsupportedType { type_name } => {
                write!(f, "no codec available for type `{type_name}`")
            }
            ErrorKind::DuplicateWireName { type_name, name } => {
                write!(f, "`{type_name}` declares multiple members named `{name}`")
            }
            ErrorKind::InvalidNumericValue { value } => write!(
                f,
                "{value} is not a valid JSON number; enable special floats to allow it"
            ),
            ErrorKind::Syntax(e) => write!(f, "syntax error: {e}"),
            ErrorKind::Io(e) => write!(f, "I/O error: {e}"),
            ErrorKind::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            ErrorKind::UnexpectedNull { expected } => {
                write!(f, "unexpected null for non-nullable {expected}")
            }
            ErrorKind::NumberOutOfRange { value, target_type } => {
                write!(f, "number `{value}` out of range for {target_type}")
            }
        }
    }
}

impl ErrorKind {
    /// Get an error code for this kind of error.
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedType { .. } => "bindery::unsupported_type",
            ErrorKind::DuplicateWireName { .. } => "bindery::duplicate_wire_name",
            ErrorKind::InvalidNumericValue { .. } => "bindery::invalid_numeric_value",
            ErrorKind::Syntax(_) => "bindery::syntax",
            ErrorKind::Io(_) => "bindery::io",
            ErrorKind::TypeMismatch { .. } => "bindery::type_mismatch",
            ErrorKind::UnexpectedNull { .. } => "bindery::unexpected_null",
            ErrorKind::NumberOutOfRange { .. } => "bindery::number_out_of_range",
        }
    }
}

/// Result type for bindery operations
pub type Result<T, E = Error> = core::result::Result<T, E>;
