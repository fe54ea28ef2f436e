//! Lexical nesting state machine shared by the reader and the writer.
//!
//! Every structural decision (is a separator needed? may a value appear here?)
//! is answered by the frame on top of the [`ScopeStack`]. Nothing counts
//! elements; the "nonempty" variant of a frame is the only memory of prior
//! siblings.

use core::fmt;

/// One frame of nesting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// No top-level value has been seen yet.
    EmptyDocument,
    /// A top-level value has been completed.
    NonemptyDocument,
    /// Inside `[` with no elements yet.
    EmptyArray,
    /// Inside `[` after at least one element.
    NonemptyArray,
    /// Inside `{` with no members yet.
    EmptyObject,
    /// A name was emitted and its value is pending.
    DanglingName,
    /// Inside `{` after at least one member.
    NonemptyObject,
    /// The stream was closed.
    Closed,
}

/// Operations validated against the current [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOp {
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// An object key
    Name,
    /// A scalar value or the start of a nested structure
    Value,
    /// Close the stream
    Close,
}

impl fmt::Display for ScopeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScopeOp::BeginArray => "begin array",
            ScopeOp::EndArray => "end array",
            ScopeOp::BeginObject => "begin object",
            ScopeOp::EndObject => "end object",
            ScopeOp::Name => "name",
            ScopeOp::Value => "value",
            ScopeOp::Close => "close",
        };
        f.write_str(s)
    }
}

/// Separator required in front of the token that triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Nothing precedes the token.
    None,
    /// `,` between siblings.
    Comma,
    /// `:` between a name and its value.
    Colon,
}

/// An operation that is illegal in the scope it was attempted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeViolation {
    /// What was attempted
    pub op: ScopeOp,
    /// The scope it was attempted in
    pub scope: Scope,
}

impl fmt::Display for ScopeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal {} in scope {:?}", self.op, self.scope)
    }
}

impl std::error::Error for ScopeViolation {}

/// Nesting limit used by [`ScopeStack::new`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// An array or object was opened past the stack's nesting limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthExceeded {
    /// The configured limit
    pub max_depth: usize,
}

impl fmt::Display for DepthExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nesting deeper than {} levels", self.max_depth)
    }
}

impl std::error::Error for DepthExceeded {}

/// Stack of [`Scope`] frames for one open stream.
///
/// The stack holds at most `max_depth` open arrays and objects.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Scope>,
    max_depth: usize,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A stack holding a single `EmptyDocument` frame, limited to [`DEFAULT_MAX_DEPTH`].
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// A stack holding a single `EmptyDocument` frame, limited to `max_depth` open containers.
    pub fn with_max_depth(max_depth: usize) -> Self {
        let mut frames = Vec::with_capacity(32);
        frames.push(Scope::EmptyDocument);
        Self { frames, max_depth }
    }

    /// The nesting limit.
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the nesting limit. Frames already open are kept.
    pub const fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// The current frame.
    pub fn top(&self) -> Scope {
        // The document frame is never popped.
        self.frames.last().copied().unwrap_or(Scope::Closed)
    }

    /// Number of open arrays and objects.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    fn replace_top(&mut self, scope: Scope) {
        if let Some(top) = self.frames.last_mut() {
            *top = scope;
        }
    }

    fn violation(&self, op: ScopeOp) -> ScopeViolation {
        ScopeViolation {
            op,
            scope: self.top(),
        }
    }

    /// Record that a value (scalar or nested structure) starts here.
    ///
    /// Returns the separator that must precede it. A second top-level value
    /// is only legal when `allow_multiple` is set.
    pub fn value(&mut self, allow_multiple: bool) -> Result<Delimiter, ScopeViolation> {
        match self.top() {
            Scope::EmptyDocument => {
                self.replace_top(Scope::NonemptyDocument);
                Ok(Delimiter::None)
            }
            Scope::NonemptyDocument if allow_multiple => Ok(Delimiter::None),
            Scope::EmptyArray => {
                self.replace_top(Scope::NonemptyArray);
                Ok(Delimiter::None)
            }
            Scope::NonemptyArray => Ok(Delimiter::Comma),
            Scope::DanglingName => {
                self.replace_top(Scope::NonemptyObject);
                Ok(Delimiter::Colon)
            }
            _ => Err(self.violation(ScopeOp::Value)),
        }
    }

    /// Record an object key.
    pub fn name(&mut self) -> Result<Delimiter, ScopeViolation> {
        match self.top() {
            Scope::EmptyObject => {
                self.replace_top(Scope::DanglingName);
                Ok(Delimiter::None)
            }
            Scope::NonemptyObject => {
                self.replace_top(Scope::DanglingName);
                Ok(Delimiter::Comma)
            }
            _ => Err(self.violation(ScopeOp::Name)),
        }
    }

    fn push(&mut self, scope: Scope) -> Result<(), DepthExceeded> {
        if self.depth() >= self.max_depth {
            return Err(DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        self.frames.push(scope);
        Ok(())
    }

    /// Open an array. The caller must already have recorded the value via [`Self::value`].
    pub fn push_array(&mut self) -> Result<(), DepthExceeded> {
        self.push(Scope::EmptyArray)
    }

    /// Open an object. The caller must already have recorded the value via [`Self::value`].
    pub fn push_object(&mut self) -> Result<(), DepthExceeded> {
        self.push(Scope::EmptyObject)
    }

    /// Close the innermost array, returning whether it was empty.
    pub fn end_array(&mut self) -> Result<bool, ScopeViolation> {
        match self.top() {
            Scope::EmptyArray | Scope::NonemptyArray => {
                let popped = self.frames.pop();
                Ok(popped == Some(Scope::EmptyArray))
            }
            _ => Err(self.violation(ScopeOp::EndArray)),
        }
    }

    /// Close the innermost object, returning whether it was empty.
    pub fn end_object(&mut self) -> Result<bool, ScopeViolation> {
        match self.top() {
            Scope::EmptyObject | Scope::NonemptyObject => {
                let popped = self.frames.pop();
                Ok(popped == Some(Scope::EmptyObject))
            }
            _ => Err(self.violation(ScopeOp::EndObject)),
        }
    }

    /// Close the stream. An empty document may only be closed when `allow_empty` is set.
    pub fn close(&mut self, allow_empty: bool) -> Result<(), ScopeViolation> {
        match self.top() {
            Scope::NonemptyDocument => {}
            Scope::EmptyDocument if allow_empty => {}
            _ => return Err(self.violation(ScopeOp::Close)),
        }
        self.frames.clear();
        self.frames.push(Scope::Closed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_separators_follow_nonempty_frame() {
        let mut s = ScopeStack::new();
        assert_eq!(s.value(false), Ok(Delimiter::None));
        s.push_array().unwrap();
        assert_eq!(s.value(false), Ok(Delimiter::None));
        assert_eq!(s.top(), Scope::NonemptyArray);
        assert_eq!(s.value(false), Ok(Delimiter::Comma));
        assert_eq!(s.value(false), Ok(Delimiter::Comma));
        assert_eq!(s.end_array(), Ok(false));
        assert_eq!(s.top(), Scope::NonemptyDocument);
    }

    #[test]
    fn object_alternates_name_and_value() {
        let mut s = ScopeStack::new();
        s.value(false).unwrap();
        s.push_object().unwrap();
        assert_eq!(s.name(), Ok(Delimiter::None));
        assert_eq!(s.top(), Scope::DanglingName);
        assert_eq!(s.value(false), Ok(Delimiter::Colon));
        assert_eq!(s.name(), Ok(Delimiter::Comma));
        assert_eq!(s.value(false), Ok(Delimiter::Colon));
        assert_eq!(s.end_object(), Ok(false));
    }

    #[test]
    fn value_where_name_expected_is_rejected() {
        let mut s = ScopeStack::new();
        s.value(false).unwrap();
        s.push_object().unwrap();
        let err = s.value(false).unwrap_err();
        assert_eq!(err.op, ScopeOp::Value);
        assert_eq!(err.scope, Scope::EmptyObject);
    }

    #[test]
    fn name_outside_object_is_rejected() {
        let mut s = ScopeStack::new();
        assert!(s.name().is_err());
        s.value(false).unwrap();
        s.push_array().unwrap();
        assert!(s.name().is_err());
    }

    #[test]
    fn mismatched_end_is_rejected() {
        let mut s = ScopeStack::new();
        s.value(false).unwrap();
        s.push_array().unwrap();
        assert!(s.end_object().is_err());
        assert_eq!(s.end_array(), Ok(true));

        let mut s = ScopeStack::new();
        s.value(false).unwrap();
        s.push_object().unwrap();
        s.name().unwrap();
        // a dangling name cannot be closed
        assert!(s.end_object().is_err());
    }

    #[test]
    fn second_top_level_value_needs_permission() {
        let mut s = ScopeStack::new();
        s.value(false).unwrap();
        assert!(s.value(false).is_err());
        assert_eq!(s.value(true), Ok(Delimiter::None));
    }

    #[test]
    fn closed_rejects_everything() {
        let mut s = ScopeStack::new();
        assert!(s.close(false).is_err());
        assert!(s.close(true).is_ok());
        assert_eq!(s.top(), Scope::Closed);
        assert!(s.value(true).is_err());
        assert!(s.name().is_err());
        assert!(s.end_array().is_err());
        assert!(s.close(true).is_err());
    }

    #[test]
    fn depth_tracks_open_containers() {
        let mut s = ScopeStack::new();
        assert_eq!(s.depth(), 0);
        s.value(false).unwrap();
        s.push_array().unwrap();
        s.value(false).unwrap();
        s.push_object().unwrap();
        assert_eq!(s.depth(), 2);
        s.end_object().unwrap();
        s.end_array().unwrap();
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn depth_limit_rejects_extra_frames() {
        let mut s = ScopeStack::with_max_depth(2);
        s.value(false).unwrap();
        s.push_array().unwrap();
        s.value(false).unwrap();
        s.push_object().unwrap();
        s.name().unwrap();
        s.value(false).unwrap();
        assert_eq!(s.push_array(), Err(DepthExceeded { max_depth: 2 }));
        assert_eq!(s.depth(), 2);
        assert_eq!(s.top(), Scope::NonemptyObject);

        s.end_object().unwrap();
        s.value(false).unwrap();
        assert_eq!(s.push_object(), Ok(()));
    }
}
