//! Pull reader over a complete JSON document.

use std::borrow::Cow;

use crate::error::{Result, StreamError, StreamErrorKind};
use crate::scanner::{Lexeme, Scanner, decode_string, is_json_number};
use crate::scope::{DepthExceeded, Delimiter, Scope, ScopeOp, ScopeStack, ScopeViolation};
use crate::token::Token;
use crate::{NON_EXECUTABLE_PREFIX, trace};

#[derive(Debug, Clone, Copy)]
struct Peeked {
    token: Token,
    lexeme: Lexeme,
    offset: usize,
}

/// Reads a JSON document token by token, validating nesting as it goes.
///
/// The reader decides which token may come next purely from the frame on
/// top of its [`ScopeStack`]; a value where a name is expected, a missing
/// separator, or a mismatched close bracket is reported as a syntax error
/// carrying the byte offset.
///
/// In lenient mode the reader additionally accepts the literals `NaN`,
/// `Infinity` and `-Infinity`, more than one top-level value, and a leading
/// non-executable prefix.
#[derive(Debug, Clone)]
pub struct JsonReader<'a> {
    scanner: Scanner<'a>,
    scopes: ScopeStack,
    peeked: Option<Peeked>,
    lenient: bool,
}

macro_rules! next_integer {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self) -> Result<$ty> {
            let (text, offset) = self.numeric_text(stringify!($ty))?;
            if is_json_number(&text)
                && let Ok(v) = text.parse::<$ty>()
            {
                return Ok(v);
            }
            // integral floats such as `1.0` or `2e3`
            let (min, max) = (<$ty>::MIN as f64, <$ty>::MAX as f64);
            match parse_f64(&text) {
                Some(f) if f.fract() == 0.0 && f >= min && f < max => Ok(f as $ty),
                _ => Err(self.error(
                    StreamErrorKind::InvalidNumber {
                        text: text.into_owned(),
                        target: stringify!($ty),
                    },
                    offset,
                )),
            }
        }
    };
}

impl<'a> JsonReader<'a> {
    /// Create a strict reader over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            scanner: Scanner::new(input),
            scopes: ScopeStack::new(),
            peeked: None,
            lenient: false,
        }
    }

    /// Whether lenient extensions are accepted.
    pub const fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Enable or disable lenient extensions.
    pub const fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    /// Maximum number of arrays and objects open at once.
    pub const fn max_depth(&self) -> usize {
        self.scopes.max_depth()
    }

    /// Limit how deeply arrays and objects may nest. Opening one more is a
    /// [`StreamErrorKind::TooDeep`] error.
    pub const fn set_max_depth(&mut self, max_depth: usize) {
        self.scopes.set_max_depth(max_depth);
    }

    /// The current nesting frame.
    pub fn scope(&self) -> Scope {
        self.scopes.top()
    }

    /// Byte offset of the next unread token.
    pub fn offset(&self) -> usize {
        self.peeked.map_or(self.scanner.pos(), |p| p.offset)
    }

    fn error(&self, kind: StreamErrorKind, offset: usize) -> StreamError {
        StreamError::at(kind, self.scanner.input(), offset)
    }

    fn nesting(&self, violation: ScopeViolation, offset: usize) -> StreamError {
        trace!(?violation, offset, "reader scope violation");
        self.error(StreamErrorKind::Nesting(violation), offset)
    }

    fn too_deep(&self, exceeded: DepthExceeded, offset: usize) -> StreamError {
        trace!(max_depth = exceeded.max_depth, offset, "reader nesting limit reached");
        self.error(StreamErrorKind::TooDeep(exceeded), offset)
    }

    fn unexpected(&self, lexeme: Lexeme, offset: usize, expected: &'static str) -> StreamError {
        if lexeme == Lexeme::Eof {
            return self.error(StreamErrorKind::UnexpectedEof { expected }, offset);
        }
        self.error(
            StreamErrorKind::UnexpectedToken {
                got: lexeme.describe(self.scanner.input()),
                expected,
            },
            offset,
        )
    }

    /// Kind of the next token, without consuming it.
    pub fn peek(&mut self) -> Result<Token> {
        self.peek_full().map(|p| p.token)
    }

    fn peek_full(&mut self) -> Result<Peeked> {
        if let Some(p) = self.peeked {
            return Ok(p);
        }
        let p = self.do_peek()?;
        self.peeked = Some(p);
        Ok(p)
    }

    fn do_peek(&mut self) -> Result<Peeked> {
        let top = self.scopes.top();
        if top == Scope::EmptyDocument && self.lenient {
            self.scanner.strip_prefix(NON_EXECUTABLE_PREFIX);
        }
        let (mut lexeme, mut offset) = self.scanner.next_lexeme()?;

        match top {
            Scope::EmptyArray | Scope::NonemptyArray => {
                if lexeme == Lexeme::ArrayEnd {
                    return Ok(Peeked {
                        token: Token::EndArray,
                        lexeme,
                        offset,
                    });
                }
                let delimiter = self
                    .scopes
                    .value(false)
                    .map_err(|v| self.nesting(v, offset))?;
                if delimiter == Delimiter::Comma {
                    if lexeme != Lexeme::Comma {
                        return Err(self.unexpected(lexeme, offset, "',' or ']'"));
                    }
                    (lexeme, offset) = self.scanner.next_lexeme()?;
                }
                self.value_token(lexeme, offset)
            }
            Scope::EmptyObject | Scope::NonemptyObject => {
                if lexeme == Lexeme::ObjectEnd {
                    return Ok(Peeked {
                        token: Token::EndObject,
                        lexeme,
                        offset,
                    });
                }
                let delimiter = self.scopes.name().map_err(|v| self.nesting(v, offset))?;
                if delimiter == Delimiter::Comma {
                    if lexeme != Lexeme::Comma {
                        return Err(self.unexpected(lexeme, offset, "',' or '}'"));
                    }
                    (lexeme, offset) = self.scanner.next_lexeme()?;
                }
                match lexeme {
                    Lexeme::String { raw_control, .. } => {
                        self.check_raw_control(raw_control)?;
                        Ok(Peeked {
                            token: Token::Name,
                            lexeme,
                            offset,
                        })
                    }
                    _ => Err(self.unexpected(lexeme, offset, "a name")),
                }
            }
            Scope::DanglingName => {
                self.scopes
                    .value(false)
                    .map_err(|v| self.nesting(v, offset))?;
                if lexeme != Lexeme::Colon {
                    return Err(self.unexpected(lexeme, offset, "':'"));
                }
                (lexeme, offset) = self.scanner.next_lexeme()?;
                self.value_token(lexeme, offset)
            }
            Scope::EmptyDocument => {
                if lexeme == Lexeme::Eof {
                    return Err(self.unexpected(lexeme, offset, "a value"));
                }
                self.scopes
                    .value(false)
                    .map_err(|v| self.nesting(v, offset))?;
                self.value_token(lexeme, offset)
            }
            Scope::NonemptyDocument => {
                if lexeme == Lexeme::Eof {
                    return Ok(Peeked {
                        token: Token::EndDocument,
                        lexeme,
                        offset,
                    });
                }
                if !self.lenient {
                    return Err(self.unexpected(lexeme, offset, "end of document"));
                }
                self.scopes
                    .value(true)
                    .map_err(|v| self.nesting(v, offset))?;
                self.value_token(lexeme, offset)
            }
            Scope::Closed => Err(self.nesting(
                ScopeViolation {
                    op: ScopeOp::Value,
                    scope: top,
                },
                offset,
            )),
        }
    }

    fn value_token(&self, lexeme: Lexeme, offset: usize) -> Result<Peeked> {
        let token = match lexeme {
            Lexeme::ObjectStart => Token::BeginObject,
            Lexeme::ArrayStart => Token::BeginArray,
            Lexeme::String { raw_control, .. } => {
                self.check_raw_control(raw_control)?;
                Token::String
            }
            Lexeme::Number { non_finite, .. } => {
                if non_finite && !self.lenient {
                    return Err(self.unexpected(lexeme, offset, "a finite number"));
                }
                Token::Number
            }
            Lexeme::True | Lexeme::False => Token::Bool,
            Lexeme::Null => Token::Null,
            _ => return Err(self.unexpected(lexeme, offset, "a value")),
        };
        Ok(Peeked {
            token,
            lexeme,
            offset,
        })
    }

    /// Strict readers reject control characters that appear unescaped inside strings.
    fn check_raw_control(&self, raw_control: Option<usize>) -> Result<()> {
        match raw_control {
            Some(at) if !self.lenient => {
                let c = char::from(self.scanner.input().as_bytes()[at]);
                Err(self.error(StreamErrorKind::UnexpectedChar(c), at))
            }
            _ => Ok(()),
        }
    }

    fn take(&mut self, expected: Token, what: &'static str) -> Result<Peeked> {
        let p = self.peek_full()?;
        if p.token != expected {
            return Err(self.unexpected(p.lexeme, p.offset, what));
        }
        self.peeked = None;
        Ok(p)
    }

    fn text(&self, lexeme: Lexeme) -> Result<Cow<'a, str>> {
        let input = self.scanner.input();
        match lexeme {
            Lexeme::String {
                start,
                end,
                has_escapes: true,
                ..
            } => decode_string(input, start, end).map(Cow::Owned),
            Lexeme::String { start, end, .. } | Lexeme::Number { start, end, .. } => {
                Ok(Cow::Borrowed(&input[start..end]))
            }
            _ => Ok(Cow::Borrowed("")),
        }
    }

    /// Consume `[`.
    pub fn begin_array(&mut self) -> Result<()> {
        let p = self.take(Token::BeginArray, "'['")?;
        self.scopes
            .push_array()
            .map_err(|d| self.too_deep(d, p.offset))
    }

    /// Consume `]`.
    pub fn end_array(&mut self) -> Result<()> {
        let p = self.take(Token::EndArray, "']'")?;
        self.scopes
            .end_array()
            .map_err(|v| self.nesting(v, p.offset))?;
        Ok(())
    }

    /// Consume `{`.
    pub fn begin_object(&mut self) -> Result<()> {
        let p = self.take(Token::BeginObject, "'{'")?;
        self.scopes
            .push_object()
            .map_err(|d| self.too_deep(d, p.offset))
    }

    /// Consume `}`.
    pub fn end_object(&mut self) -> Result<()> {
        let p = self.take(Token::EndObject, "'}'")?;
        self.scopes
            .end_object()
            .map_err(|v| self.nesting(v, p.offset))?;
        Ok(())
    }

    /// True if the current array or object has another element.
    pub fn has_next(&mut self) -> Result<bool> {
        Ok(!matches!(
            self.peek()?,
            Token::EndArray | Token::EndObject | Token::EndDocument
        ))
    }

    /// Consume an object key.
    pub fn next_name(&mut self) -> Result<String> {
        let p = self.take(Token::Name, "a name")?;
        Ok(self.text(p.lexeme)?.into_owned())
    }

    /// Consume a string value. Numbers are returned as their literal text.
    pub fn next_string(&mut self) -> Result<String> {
        let p = self.peek_full()?;
        match p.token {
            Token::String | Token::Number => {
                self.peeked = None;
                Ok(self.text(p.lexeme)?.into_owned())
            }
            _ => Err(self.unexpected(p.lexeme, p.offset, "a string")),
        }
    }

    /// Consume `true` or `false`.
    pub fn next_bool(&mut self) -> Result<bool> {
        let p = self.take(Token::Bool, "a boolean")?;
        Ok(p.lexeme == Lexeme::True)
    }

    /// Consume `null`.
    pub fn next_null(&mut self) -> Result<()> {
        self.take(Token::Null, "null")?;
        Ok(())
    }

    /// Text of a number token, or of a string token holding a number.
    fn numeric_text(&mut self, target: &'static str) -> Result<(Cow<'a, str>, usize)> {
        let p = self.peek_full()?;
        match p.token {
            Token::Number | Token::String => {
                self.peeked = None;
                let text = self.text(p.lexeme)?;
                trace!(target, text = &*text, "numeric token");
                Ok((text, p.offset))
            }
            _ => Err(self.unexpected(p.lexeme, p.offset, "a number")),
        }
    }

    /// Consume a number as `f64`.
    ///
    /// Quoted numbers are accepted. Non-finite results are rejected unless lenient.
    pub fn next_f64(&mut self) -> Result<f64> {
        let (text, offset) = self.numeric_text("f64")?;
        let Some(value) = parse_f64(&text) else {
            return Err(self.error(
                StreamErrorKind::InvalidNumber {
                    text: text.into_owned(),
                    target: "f64",
                },
                offset,
            ));
        };
        if !value.is_finite() && !self.lenient {
            return Err(self.error(StreamErrorKind::NonFinite(value), offset));
        }
        Ok(value)
    }

    next_integer!(
        /// Consume a number as `i64`. Quoted and integral floating-point forms are accepted.
        next_i64,
        i64
    );
    next_integer!(
        /// Consume a number as `u64`.
        next_u64,
        u64
    );
    next_integer!(
        /// Consume a number as `i128`.
        next_i128,
        i128
    );
    next_integer!(
        /// Consume a number as `u128`.
        next_u128,
        u128
    );

    /// True if nothing has been read and the input holds no value at all.
    ///
    /// Whitespace only (and, when lenient, a bare non-executable prefix)
    /// counts as empty; a literal `null` does not.
    pub fn is_empty_document(&self) -> bool {
        if self.peeked.is_some() || self.scopes.top() != Scope::EmptyDocument {
            return false;
        }
        let mut scanner = self.scanner.clone();
        if self.lenient {
            scanner.strip_prefix(NON_EXECUTABLE_PREFIX);
        }
        matches!(scanner.next_lexeme(), Ok((Lexeme::Eof, _)))
    }

    /// Fail unless only whitespace remains after the values read so far.
    pub fn expect_end(&mut self) -> Result<()> {
        let p = self.peek_full()?;
        if p.token != Token::EndDocument {
            return Err(self.unexpected(p.lexeme, p.offset, "end of document"));
        }
        Ok(())
    }

    /// Skip the next value, including all of its nested content.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let p = self.peek_full()?;
            match p.token {
                Token::BeginArray => {
                    self.begin_array()?;
                    depth += 1;
                }
                Token::BeginObject => {
                    self.begin_object()?;
                    depth += 1;
                }
                Token::EndArray | Token::EndObject if depth > 0 => {
                    if p.token == Token::EndArray {
                        self.end_array()?;
                    } else {
                        self.end_object()?;
                    }
                    depth -= 1;
                }
                Token::Name if depth > 0 => {
                    self.peeked = None;
                    continue;
                }
                Token::EndArray | Token::EndObject | Token::Name | Token::EndDocument => {
                    return Err(self.unexpected(p.lexeme, p.offset, "a value"));
                }
                Token::String | Token::Number | Token::Bool | Token::Null => {
                    self.peeked = None;
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

fn parse_f64(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        t if is_json_number(t) => t.parse().ok(),
        _ => None,
    }
}
