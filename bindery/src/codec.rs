//! The codec and codec-factory capabilities.

use core::any::{Any, type_name};
use std::sync::Arc;

use bindery_stream::{JsonReader, JsonWriter, Token};

use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::{Error, Result};
use crate::registry::Resolution;

/// Writes and reads values of exactly one type.
///
/// Codecs are shared between threads and must not hold per-call state.
/// `None` stands for the null literal on both sides.
pub trait Codec: Send + Sync {
    /// Encode `value` onto `out`.
    fn write(&self, out: &mut JsonWriter<'_>, value: Option<&dyn Any>) -> Result<()>;

    /// Decode one value from `input`.
    fn read(&self, input: &mut JsonReader<'_>) -> Result<Option<Box<dyn Any>>>;
}

/// Produces codecs for the types it understands.
pub trait CodecFactory: Send + Sync {
    /// Build a codec for `ty`, or decline with `Ok(None)`.
    ///
    /// Factories that need codecs for other types (members, elements)
    /// obtain them through `cx`, which keeps recursive resolution cycle-safe.
    fn try_create(&self, cx: &mut Resolution<'_>, ty: &TypeDescriptor)
    -> Result<Option<Arc<dyn Codec>>>;
}

/// A codec written against a concrete value type.
///
/// Wrap it in [`NullSafe`] to obtain an erased [`Codec`].
pub trait TypedCodec: Send + Sync {
    /// The handled type
    type Value: Describe;

    /// Encode a present value.
    fn encode(&self, out: &mut JsonWriter<'_>, value: &Self::Value) -> Result<()>;

    /// Decode a value; the next token is known not to be null.
    fn decode(&self, input: &mut JsonReader<'_>) -> Result<Self::Value>;
}

/// Lifts a [`TypedCodec`] into a [`Codec`], handling null on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSafe<C>(pub C);

impl<C: TypedCodec> Codec for NullSafe<C> {
    fn write(&self, out: &mut JsonWriter<'_>, value: Option<&dyn Any>) -> Result<()> {
        let Some(value) = value else {
            out.null_value()?;
            return Ok(());
        };
        let value = value
            .downcast_ref::<C::Value>()
            .ok_or_else(|| Error::type_mismatch(type_name::<C::Value>(), "a value of another type"))?;
        self.0.encode(out, value)
    }

    fn read(&self, input: &mut JsonReader<'_>) -> Result<Option<Box<dyn Any>>> {
        if input.peek()? == Token::Null {
            input.next_null()?;
            return Ok(None);
        }
        Ok(Some(Box::new(self.0.decode(input)?)))
    }
}
