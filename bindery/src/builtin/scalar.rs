use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;

use bindery_stream::{JsonReader, JsonWriter};

use crate::codec::TypedCodec;
use crate::descriptor::Describe;
use crate::error::{Error, ErrorKind, Result};

/// `String` as a JSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl TypedCodec for StringCodec {
    type Value = String;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &String) -> Result<()> {
        Ok(out.string_value(value)?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> Result<String> {
        Ok(input.next_string()?)
    }
}

/// `bool` as `true` or `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl TypedCodec for BoolCodec {
    type Value = bool;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &bool) -> Result<()> {
        Ok(out.bool_value(*value)?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> Result<bool> {
        Ok(input.next_bool()?)
    }
}

/// `char` as a one-character string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCodec;

impl TypedCodec for CharCodec {
    type Value = char;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &char) -> Result<()> {
        let mut buf = [0u8; 4];
        Ok(out.string_value(value.encode_utf8(&mut buf))?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> Result<char> {
        let s = input.next_string()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::type_mismatch("a single character", format!("{s:?}"))),
        }
    }
}

/// Integers of up to 32 bits, read through `i64` and range-checked.
pub struct IntCodec<T> {
    _ty: PhantomData<fn() -> T>,
}

impl<T> IntCodec<T> {
    /// The codec for `T`.
    pub const fn new() -> Self {
        Self { _ty: PhantomData }
    }
}

impl<T> Default for IntCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IntCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntCodec<{}>", type_name::<T>())
    }
}

impl<T> TypedCodec for IntCodec<T>
where
    T: Describe + Copy + Into<i64> + TryFrom<i64>,
{
    type Value = T;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &T) -> Result<()> {
        Ok(out.i64_value((*value).into())?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> Result<T> {
        let wide = input.next_i64()?;
        T::try_from(wide).map_err(|_| {
            Error::new(ErrorKind::NumberOutOfRange {
                value: wide.to_string(),
                target_type: type_name::<T>(),
            })
        })
    }
}
