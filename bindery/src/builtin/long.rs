use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;

use bindery_stream::{JsonReader, JsonWriter};

use crate::codec::TypedCodec;
use crate::config::LongPolicy;
use crate::error::Result;

/// 64- and 128-bit integers, optionally written as strings.
///
/// Reading accepts a number or a numeric string under either policy.
pub struct LongCodec<T> {
    policy: LongPolicy,
    _ty: PhantomData<fn() -> T>,
}

impl<T> LongCodec<T> {
    /// The codec for `T` under `policy`.
    pub const fn new(policy: LongPolicy) -> Self {
        Self {
            policy,
            _ty: PhantomData,
        }
    }
}

impl<T> fmt::Debug for LongCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LongCodec")
            .field("ty", &type_name::<T>())
            .field("policy", &self.policy)
            .finish()
    }
}

macro_rules! long_codec {
    ($($ty:ty => $write:ident, $read:ident);* $(;)?) => {
        $(
            impl TypedCodec for LongCodec<$ty> {
                type Value = $ty;

                fn encode(&self, out: &mut JsonWriter<'_>, value: &$ty) -> Result<()> {
                    match self.policy {
                        LongPolicy::Default => out.$write(*value)?,
                        LongPolicy::String => {
                            let mut buf = itoa::Buffer::new();
                            out.string_value(buf.format(*value))?
                        }
                    }
                    Ok(())
                }

                fn decode(&self, input: &mut JsonReader<'_>) -> Result<$ty> {
                    Ok(input.$read()?)
                }
            }
        )*
    };
}

long_codec! {
    i64 => i64_value, next_i64;
    u64 => u64_value, next_u64;
    i128 => i128_value, next_i128;
    u128 => u128_value, next_u128;
}
