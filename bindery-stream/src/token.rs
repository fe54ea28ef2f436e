/// Kind of the next value-level token, as reported by [`JsonReader::peek`](crate::JsonReader::peek).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
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
    /// A string value
    String,
    /// A number, including `NaN`/`Infinity` in lenient mode
    Number,
    /// `true` or `false`
    Bool,
    /// `null`
    Null,
    /// No further top-level content
    EndDocument,
}
