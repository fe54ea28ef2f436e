//! Lexical scanner that finds token boundaries in a string slice.
//!
//! The scanner does not know about nesting; it only splits the input into
//! lexemes. String and number lexemes are returned as byte ranges and are
//! decoded on demand by the reader.

use crate::error::{Result, StreamError, StreamErrorKind};

/// One lexical unit of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// A quoted string; the range excludes the quotes.
    String {
        /// Start of content
        start: usize,
        /// End of content
        end: usize,
        /// Whether the content contains `\` escapes
        has_escapes: bool,
        /// Offset of the first unescaped control character, if any
        raw_control: Option<usize>,
    },
    /// Number text, including the non-finite literals `NaN`, `Infinity` and `-Infinity`.
    Number {
        /// Start of the number text
        start: usize,
        /// End of the number text
        end: usize,
        /// Set for the non-finite literals
        non_finite: bool,
    },
    /// End of input
    Eof,
}

impl Lexeme {
    /// Short human-readable form for error messages.
    pub fn describe(&self, input: &str) -> String {
        match *self {
            Lexeme::ObjectStart => "'{'".into(),
            Lexeme::ObjectEnd => "'}'".into(),
            Lexeme::ArrayStart => "'['".into(),
            Lexeme::ArrayEnd => "']'".into(),
            Lexeme::Colon => "':'".into(),
            Lexeme::Comma => "','".into(),
            Lexeme::Null => "null".into(),
            Lexeme::True => "true".into(),
            Lexeme::False => "false".into(),
            Lexeme::String { start, end, .. } => format!("string \"{}\"", &input[start..end]),
            Lexeme::Number { start, end, .. } => format!("number {}", &input[start..end]),
            Lexeme::Eof => "end of input".into(),
        }
    }
}

/// Scanner over a complete input string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned at the start of `input`.
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// The input being scanned.
    pub const fn input(&self) -> &'a str {
        self.input
    }

    /// Current byte position.
    pub const fn pos(&self) -> usize {
        self.pos
    }

    fn error(&self, kind: StreamErrorKind, at: usize) -> StreamError {
        StreamError::at(kind, self.input, at)
    }

    /// Skip whitespace, then consume `prefix` if the input continues with it.
    pub fn strip_prefix(&mut self, prefix: &str) -> bool {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Scan the next lexeme, returning it with its starting offset.
    pub fn next_lexeme(&mut self) -> Result<(Lexeme, usize)> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let Some(&byte) = bytes.get(start) else {
            return Ok((Lexeme::Eof, start));
        };

        let single = |lexeme| (lexeme, start);
        let lexeme = match byte {
            b'{' => {
                self.pos += 1;
                single(Lexeme::ObjectStart)
            }
            b'}' => {
                self.pos += 1;
                single(Lexeme::ObjectEnd)
            }
            b'[' => {
                self.pos += 1;
                single(Lexeme::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                single(Lexeme::ArrayEnd)
            }
            b':' => {
                self.pos += 1;
                single(Lexeme::Colon)
            }
            b',' => {
                self.pos += 1;
                single(Lexeme::Comma)
            }
            b'"' => (self.scan_string(start)?, start),
            b'-' if bytes.get(start + 1) == Some(&b'I') => {
                (self.scan_non_finite(start, "-Infinity")?, start)
            }
            b'-' | b'0'..=b'9' => (self.scan_number(start)?, start),
            b'N' => (self.scan_non_finite(start, "NaN")?, start),
            b'I' => (self.scan_non_finite(start, "Infinity")?, start),
            b't' => (self.scan_literal(start, "true", Lexeme::True)?, start),
            b'f' => (self.scan_literal(start, "false", Lexeme::False)?, start),
            b'n' => (self.scan_literal(start, "null", Lexeme::Null)?, start),
            _ => {
                let c = self.input[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(self.error(StreamErrorKind::UnexpectedChar(c), start));
            }
        };
        Ok(lexeme)
    }

    fn scan_string(&mut self, start: usize) -> Result<Lexeme> {
        let bytes = self.input.as_bytes();
        let content_start = start + 1;
        let mut pos = content_start;
        let mut has_escapes = false;
        let mut raw_control = None;
        while let Some(&b) = bytes.get(pos) {
            match b {
                b'"' => {
                    self.pos = pos + 1;
                    return Ok(Lexeme::String {
                        start: content_start,
                        end: pos,
                        has_escapes,
                        raw_control,
                    });
                }
                b'\\' => {
                    has_escapes = true;
                    pos += 2;
                }
                0x00..=0x1f => {
                    raw_control = raw_control.or(Some(pos));
                    pos += 1;
                }
                _ => pos += 1,
            }
        }
        Err(self.error(
            StreamErrorKind::UnexpectedEof {
                expected: "closing quote",
            },
            self.input.len(),
        ))
    }

    fn scan_number(&mut self, start: usize) -> Result<Lexeme> {
        let bytes = self.input.as_bytes();
        let mut end = start;
        while let Some(&b) = bytes.get(end) {
            match b {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => end += 1,
                _ => break,
            }
        }
        let text = &self.input[start..end];
        if !is_json_number(text) {
            return Err(self.error(
                StreamErrorKind::InvalidNumber {
                    text: text.to_string(),
                    target: "number",
                },
                start,
            ));
        }
        self.pos = end;
        Ok(Lexeme::Number {
            start,
            end,
            non_finite: false,
        })
    }

    fn scan_non_finite(&mut self, start: usize, literal: &'static str) -> Result<Lexeme> {
        self.expect_literal(start, literal)?;
        Ok(Lexeme::Number {
            start,
            end: self.pos,
            non_finite: true,
        })
    }

    fn scan_literal(&mut self, start: usize, literal: &'static str, lexeme: Lexeme) -> Result<Lexeme> {
        self.expect_literal(start, literal)?;
        Ok(lexeme)
    }

    fn expect_literal(&mut self, start: usize, literal: &'static str) -> Result<()> {
        let rest = &self.input[start..];
        if !rest.starts_with(literal) {
            if literal.starts_with(rest) {
                return Err(self.error(StreamErrorKind::UnexpectedEof { expected: literal }, start));
            }
            let c = rest.chars().next().unwrap_or('\u{fffd}');
            return Err(self.error(StreamErrorKind::UnexpectedChar(c), start));
        }
        let end = start + literal.len();
        // `nullx` or `true1` must not lex as a literal followed by garbage
        if let Some(&b) = self.input.as_bytes().get(end)
            && (b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(self.error(StreamErrorKind::UnexpectedChar(b as char), end));
        }
        self.pos = end;
        Ok(())
    }
}

/// Whether `text` follows the JSON number grammar.
pub fn is_json_number(text: &str) -> bool {
    let b = text.as_bytes();
    let mut i = 0;
    if b.get(i) == Some(&b'-') {
        i += 1;
    }
    match b.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while matches!(b.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
        }
        _ => return false,
    }
    if b.get(i) == Some(&b'.') {
        i += 1;
        let digits = i;
        while matches!(b.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
        if i == digits {
            return false;
        }
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let digits = i;
        while matches!(b.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
        if i == digits {
            return false;
        }
    }
    i == b.len()
}

/// Decode the escape sequences in `input[start..end]`.
pub fn decode_string(input: &str, start: usize, end: usize) -> Result<String> {
    let slice = &input[start..end];
    let mut result = String::with_capacity(slice.len());
    let invalid = |at: usize| StreamError::at(StreamErrorKind::InvalidEscape, input, start + at);

    let mut rest = slice;
    let mut consumed = 0;
    while let Some(idx) = rest.find('\\') {
        result.push_str(&rest[..idx]);
        let esc = idx + 1;
        let Some(&kind) = rest.as_bytes().get(esc) else {
            return Err(invalid(consumed + idx));
        };
        let mut advance = esc + 1;
        match kind {
            b'"' => result.push('"'),
            b'\\' => result.push('\\'),
            b'/' => result.push('/'),
            b'b' => result.push('\x08'),
            b'f' => result.push('\x0c'),
            b'n' => result.push('\n'),
            b'r' => result.push('\r'),
            b't' => result.push('\t'),
            b'u' => {
                let high = hex4(rest, advance).ok_or_else(|| invalid(consumed + idx))?;
                advance += 4;
                let code_point = if (0xD800..=0xDBFF).contains(&high) {
                    // high surrogate must be followed by an escaped low surrogate
                    if !rest[advance..].starts_with("\\u") {
                        return Err(invalid(consumed + idx));
                    }
                    let low = hex4(rest, advance + 2).ok_or_else(|| invalid(consumed + advance))?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(invalid(consumed + advance));
                    }
                    advance += 6;
                    0x10000 + ((u32::from(high) & 0x3FF) << 10) + (u32::from(low) & 0x3FF)
                } else {
                    u32::from(high)
                };
                let c = char::from_u32(code_point).ok_or_else(|| invalid(consumed + idx))?;
                result.push(c);
            }
            _ => return Err(invalid(consumed + idx)),
        }
        consumed += advance;
        rest = &rest[advance..];
    }
    result.push_str(rest);
    Ok(result)
}

fn hex4(s: &str, at: usize) -> Option<u16> {
    let digits = s.get(at..at + 4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(input: &str) -> Vec<Lexeme> {
        let mut scanner = Scanner::new(input);
        let mut out = Vec::new();
        loop {
            let (lexeme, _) = scanner.next_lexeme().unwrap();
            out.push(lexeme);
            if lexeme == Lexeme::Eof {
                return out;
            }
        }
    }

    #[test]
    fn structural_tokens() {
        assert_eq!(
            lexemes(" { } [ ] : , "),
            vec![
                Lexeme::ObjectStart,
                Lexeme::ObjectEnd,
                Lexeme::ArrayStart,
                Lexeme::ArrayEnd,
                Lexeme::Colon,
                Lexeme::Comma,
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn string_ranges_exclude_quotes() {
        assert_eq!(
            lexemes(r#""hi" "a\"b""#)[..2],
            [
                Lexeme::String {
                    start: 1,
                    end: 3,
                    has_escapes: false,
                    raw_control: None,
                },
                Lexeme::String {
                    start: 6,
                    end: 10,
                    has_escapes: true,
                    raw_control: None,
                },
            ]
        );
    }

    #[test]
    fn raw_control_characters_are_located() {
        assert_eq!(
            lexemes("\"a\tb\n\"")[0],
            Lexeme::String {
                start: 1,
                end: 5,
                has_escapes: false,
                raw_control: Some(2),
            }
        );
    }

    #[test]
    fn non_finite_literals_lex_as_numbers() {
        for input in ["NaN", "Infinity", "-Infinity"] {
            assert_eq!(
                lexemes(input)[0],
                Lexeme::Number {
                    start: 0,
                    end: input.len(),
                    non_finite: true
                }
            );
        }
    }

    #[test]
    fn number_grammar() {
        for ok in ["0", "-0", "12", "1.5", "-1.5e10", "2E-3", "1e+2"] {
            assert!(is_json_number(ok), "{ok}");
        }
        for bad in ["", "-", "01", "1.", ".5", "1e", "1e+", "+1", "1-2"] {
            assert!(!is_json_number(bad), "{bad}");
        }
        let err = Scanner::new("01").next_lexeme().unwrap_err();
        assert_eq!(err.kind.code(), "stream::invalid_number");
    }

    #[test]
    fn literal_followed_by_garbage_is_rejected() {
        assert!(Scanner::new("nullx").next_lexeme().is_err());
        let err = Scanner::new("tru").next_lexeme().unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn unterminated_string_is_eof() {
        let err = Scanner::new("\"abc").next_lexeme().unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn decodes_standard_escapes() {
        let input = r#"a\"b\\c\/d\b\f\n\r\t"#;
        assert_eq!(
            decode_string(input, 0, input.len()).unwrap(),
            "a\"b\\c/d\u{8}\u{c}\n\r\t"
        );
    }

    #[test]
    fn decodes_unicode_and_surrogate_pairs() {
        let input = r"\u00e9 \ud83d\ude00";
        assert_eq!(decode_string(input, 0, input.len()).unwrap(), "é 😀");
    }

    #[test]
    fn lone_surrogate_is_rejected() {
        let input = r"\ud83d!";
        assert!(decode_string(input, 0, input.len()).is_err());
        let input = r"\ude00";
        assert!(decode_string(input, 0, input.len()).is_err());
    }

    #[test]
    fn unknown_escape_is_rejected() {
        let input = r"\q";
        let err = decode_string(input, 0, input.len()).unwrap_err();
        assert_eq!(err.kind.code(), "stream::invalid_escape");
    }
}
