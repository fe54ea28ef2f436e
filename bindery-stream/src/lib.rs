#![warn(missing_docs)]
//! Streaming JSON reader and writer for bindery.
//!
//! Both directions share one lexical-nesting state machine ([`ScopeStack`]):
//! the writer consults it to decide which separator precedes each token and
//! to refuse structurally invalid call sequences, the reader consults it to
//! decide which token may legally come next.
//!
//! ```
//! use bindery_stream::{JsonReader, JsonWriter};
//!
//! let mut out = Vec::new();
//! let mut w = JsonWriter::new(&mut out);
//! w.begin_object().unwrap();
//! w.name("id").unwrap();
//! w.i64_value(5).unwrap();
//! w.end_object().unwrap();
//! w.close().unwrap();
//! assert_eq!(out, br#"{"id":5}"#);
//!
//! let mut r = JsonReader::new(r#"{"id":5}"#);
//! r.begin_object().unwrap();
//! assert_eq!(r.next_name().unwrap(), "id");
//! assert_eq!(r.next_i64().unwrap(), 5);
//! r.end_object().unwrap();
//! ```

/// Trace-level logging macro that forwards to `tracing::trace!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Trace-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use trace;

mod error;
mod reader;
mod scanner;
mod scope;
mod token;
mod writer;

pub use error::{Result, StreamError, StreamErrorKind};
pub use reader::JsonReader;
pub use scanner::{Lexeme, Scanner, is_json_number};
pub use scope::{
    DEFAULT_MAX_DEPTH, DepthExceeded, Delimiter, Scope, ScopeOp, ScopeStack, ScopeViolation,
};
pub use token::Token;
pub use writer::{JsonWriter, WriterOptions};

/// Line that may precede a document to make it non-executable as script.
///
/// Writers emit it on request; lenient readers skip it.
pub const NON_EXECUTABLE_PREFIX: &str = ")]}'\n";
