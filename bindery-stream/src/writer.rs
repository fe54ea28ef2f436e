//! Push writer that emits structurally valid JSON.

use std::io;

use crate::error::{Result, StreamError, StreamErrorKind};
use crate::scope::{Delimiter, Scope, ScopeOp, ScopeStack, ScopeViolation};
use crate::trace;

/// Formatting switches that a caller may temporarily override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Permit non-finite numbers and multiple top-level values (default: false)
    pub lenient: bool,

    /// Escape `<`, `>`, `&`, `=` and `'` as unicode escapes (default: false)
    pub html_safe: bool,

    /// Emit members whose value is null; when off both name and value are dropped (default: true)
    pub serialize_nulls: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            lenient: false,
            html_safe: false,
            serialize_nulls: true,
        }
    }
}

/// Writes one JSON document to a byte sink.
///
/// Separators are derived from the scope state machine, never from element
/// counts, so every accepted call sequence yields well-formed output. Names
/// are deferred until their value arrives; a null value with
/// `serialize_nulls` disabled drops the pending name as well.
pub struct JsonWriter<'w> {
    out: &'w mut dyn io::Write,
    scopes: ScopeStack,
    indent: Option<String>,
    deferred_name: Option<String>,
    options: WriterOptions,
}

impl core::fmt::Debug for JsonWriter<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JsonWriter")
            .field("scopes", &self.scopes)
            .field("indent", &self.indent)
            .field("deferred_name", &self.deferred_name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'w> JsonWriter<'w> {
    /// Create a compact writer with default options.
    pub fn new(out: &'w mut dyn io::Write) -> Self {
        Self {
            out,
            scopes: ScopeStack::with_max_depth(usize::MAX),
            indent: None,
            deferred_name: None,
            options: WriterOptions::default(),
        }
    }

    /// Pretty-print using `indent` per nesting level. An empty string means compact output.
    pub fn set_indent(&mut self, indent: &str) {
        self.indent = (!indent.is_empty()).then(|| indent.to_string());
    }

    /// Current option values.
    pub const fn options(&self) -> WriterOptions {
        self.options
    }

    /// Replace all option values at once.
    pub const fn set_options(&mut self, options: WriterOptions) {
        self.options = options;
    }

    /// Permit non-finite numbers and multiple top-level values.
    pub const fn set_lenient(&mut self, lenient: bool) {
        self.options.lenient = lenient;
    }

    /// Whether the writer is lenient.
    pub const fn is_lenient(&self) -> bool {
        self.options.lenient
    }

    /// Escape HTML-significant characters.
    pub const fn set_html_safe(&mut self, html_safe: bool) {
        self.options.html_safe = html_safe;
    }

    /// Emit members whose value is null.
    pub const fn set_serialize_nulls(&mut self, serialize_nulls: bool) {
        self.options.serialize_nulls = serialize_nulls;
    }

    /// Whether null members are emitted.
    pub const fn serialize_nulls(&self) -> bool {
        self.options.serialize_nulls
    }

    /// The current nesting frame.
    pub fn scope(&self) -> Scope {
        self.scopes.top()
    }

    fn nesting(violation: ScopeViolation) -> StreamError {
        trace!(?violation, "writer scope violation");
        StreamError::without_offset(StreamErrorKind::Nesting(violation))
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn newline(&mut self) -> Result<()> {
        let Some(indent) = &self.indent else {
            return Ok(());
        };
        let mut buf = Vec::with_capacity(1 + indent.len() * self.scopes.depth());
        buf.push(b'\n');
        for _ in 0..self.scopes.depth() {
            buf.extend_from_slice(indent.as_bytes());
        }
        self.raw(&buf)
    }

    fn write_deferred_name(&mut self) -> Result<()> {
        let Some(name) = self.deferred_name.take() else {
            return Ok(());
        };
        let delimiter = self.scopes.name().map_err(Self::nesting)?;
        if delimiter == Delimiter::Comma {
            self.raw(b",")?;
        }
        self.newline()?;
        self.write_string(&name)
    }

    fn before_value(&mut self) -> Result<()> {
        let was_empty_array = self.scopes.top() == Scope::EmptyArray;
        match self
            .scopes
            .value(self.options.lenient)
            .map_err(Self::nesting)?
        {
            Delimiter::Comma => {
                self.raw(b",")?;
                self.newline()
            }
            Delimiter::Colon => {
                let sep: &[u8] = if self.indent.is_some() { b": " } else { b":" };
                self.raw(sep)
            }
            Delimiter::None if was_empty_array => self.newline(),
            Delimiter::None => Ok(()),
        }
    }

    fn open(&mut self, op: ScopeOp, bracket: &[u8]) -> Result<()> {
        self.write_deferred_name()?;
        self.before_value()?;
        match op {
            ScopeOp::BeginArray => self.scopes.push_array(),
            _ => self.scopes.push_object(),
        }
        .map_err(|d| StreamError::without_offset(StreamErrorKind::TooDeep(d)))?;
        self.raw(bracket)
    }

    fn close_scope(&mut self, op: ScopeOp, bracket: &[u8]) -> Result<()> {
        if self.deferred_name.is_some() {
            return Err(Self::nesting(ScopeViolation {
                op,
                scope: Scope::DanglingName,
            }));
        }
        let was_empty = match op {
            ScopeOp::EndArray => self.scopes.end_array(),
            _ => self.scopes.end_object(),
        }
        .map_err(Self::nesting)?;
        if !was_empty {
            self.newline()?;
        }
        self.raw(bracket)
    }

    /// Emit `[`.
    pub fn begin_array(&mut self) -> Result<()> {
        self.open(ScopeOp::BeginArray, b"[")
    }

    /// Emit `]`.
    pub fn end_array(&mut self) -> Result<()> {
        self.close_scope(ScopeOp::EndArray, b"]")
    }

    /// Emit `{`.
    pub fn begin_object(&mut self) -> Result<()> {
        self.open(ScopeOp::BeginObject, b"{")
    }

    /// Emit `}`.
    pub fn end_object(&mut self) -> Result<()> {
        self.close_scope(ScopeOp::EndObject, b"}")
    }

    /// Record the name of the next object member. It is written together with the value.
    pub fn name(&mut self, name: &str) -> Result<()> {
        let scope = if self.deferred_name.is_some() {
            Scope::DanglingName
        } else {
            self.scopes.top()
        };
        if !matches!(scope, Scope::EmptyObject | Scope::NonemptyObject) {
            return Err(Self::nesting(ScopeViolation {
                op: ScopeOp::Name,
                scope,
            }));
        }
        self.deferred_name = Some(name.to_string());
        Ok(())
    }

    fn scalar(&mut self, text: &[u8]) -> Result<()> {
        self.write_deferred_name()?;
        self.before_value()?;
        self.raw(text)
    }

    /// Emit a string value.
    pub fn string_value(&mut self, value: &str) -> Result<()> {
        self.write_deferred_name()?;
        self.before_value()?;
        self.write_string(value)
    }

    /// Emit `true` or `false`.
    pub fn bool_value(&mut self, value: bool) -> Result<()> {
        self.scalar(if value { b"true" } else { b"false" })
    }

    /// Emit `null`, or drop the pending member entirely when nulls are not serialized.
    pub fn null_value(&mut self) -> Result<()> {
        if self.deferred_name.is_some() && !self.options.serialize_nulls {
            self.deferred_name = None;
            return Ok(());
        }
        self.scalar(b"null")
    }

    /// Emit a signed integer.
    pub fn i64_value(&mut self, value: i64) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.scalar(buf.format(value).as_bytes())
    }

    /// Emit an unsigned integer.
    pub fn u64_value(&mut self, value: u64) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.scalar(buf.format(value).as_bytes())
    }

    /// Emit a signed 128-bit integer.
    pub fn i128_value(&mut self, value: i128) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.scalar(buf.format(value).as_bytes())
    }

    /// Emit an unsigned 128-bit integer.
    pub fn u128_value(&mut self, value: u128) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.scalar(buf.format(value).as_bytes())
    }

    /// Emit a double. Non-finite values need a lenient writer.
    pub fn f64_value(&mut self, value: f64) -> Result<()> {
        if value.is_finite() {
            let mut buf = ryu::Buffer::new();
            return self.scalar(buf.format_finite(value).as_bytes());
        }
        self.non_finite(value)
    }

    /// Emit a float. Non-finite values need a lenient writer.
    pub fn f32_value(&mut self, value: f32) -> Result<()> {
        if value.is_finite() {
            let mut buf = ryu::Buffer::new();
            return self.scalar(buf.format_finite(value).as_bytes());
        }
        self.non_finite(f64::from(value))
    }

    fn non_finite(&mut self, value: f64) -> Result<()> {
        if !self.options.lenient {
            return Err(StreamError::without_offset(StreamErrorKind::NonFinite(
                value,
            )));
        }
        let literal: &[u8] = if value.is_nan() {
            b"NaN"
        } else if value > 0.0 {
            b"Infinity"
        } else {
            b"-Infinity"
        };
        self.scalar(literal)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Finish the document. Fails unless exactly one complete top-level value was written.
    pub fn close(&mut self) -> Result<()> {
        self.scopes.close(false).map_err(Self::nesting)?;
        self.flush()
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(s.len() + 2);
        buf.push(b'"');
        for c in s.chars() {
            escape_char(&mut buf, c, self.options.html_safe);
        }
        buf.push(b'"');
        self.raw(&buf)
    }
}

fn escape_char(buf: &mut Vec<u8>, c: char, html_safe: bool) {
    match c {
        '"' => buf.extend_from_slice(b"\\\""),
        '\\' => buf.extend_from_slice(b"\\\\"),
        '\n' => buf.extend_from_slice(b"\\n"),
        '\r' => buf.extend_from_slice(b"\\r"),
        '\t' => buf.extend_from_slice(b"\\t"),
        '\u{08}' => buf.extend_from_slice(b"\\b"),
        '\u{0C}' => buf.extend_from_slice(b"\\f"),
        '\u{2028}' | '\u{2029}' => unicode_escape(buf, c),
        '<' | '>' | '&' | '=' | '\'' if html_safe => unicode_escape(buf, c),
        c if c.is_ascii_control() => unicode_escape(buf, c),
        c => {
            let mut tmp = [0u8; 4];
            buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
    }
}

fn unicode_escape(buf: &mut Vec<u8>, c: char) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let code_point = c as u32;
    buf.extend_from_slice(b"\\u");
    for shift in [12, 8, 4, 0] {
        buf.push(HEX[((code_point >> shift) & 0xF) as usize]);
    }
}
