//! Codecs for scalars and lists, registered ahead of the structural factory.

mod float;
mod list;
mod long;
mod scalar;

use core::any::TypeId;
use std::sync::Arc;

pub use float::{F32Codec, F64Codec};
pub use list::ListFactory;
pub use long::LongCodec;
pub use scalar::{BoolCodec, CharCodec, IntCodec, StringCodec};

use crate::codec::{Codec, CodecFactory, NullSafe, TypedCodec};
use crate::config::Config;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::registry::Resolution;

/// Serves one typed codec for exactly its value type.
pub struct TypedFactory {
    handles: TypeId,
    codec: Arc<dyn Codec>,
}

impl TypedFactory {
    /// A factory answering for `C::Value` with `codec`.
    pub fn new<C: TypedCodec + 'static>(codec: C) -> Self {
        Self {
            handles: TypeId::of::<C::Value>(),
            codec: Arc::new(NullSafe(codec)),
        }
    }
}

impl CodecFactory for TypedFactory {
    fn try_create(
        &self,
        _cx: &mut Resolution<'_>,
        ty: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>> {
        if ty.id() == self.handles {
            Ok(Some(self.codec.clone()))
        } else {
            Ok(None)
        }
    }
}

fn typed<C: TypedCodec + 'static>(codec: C) -> Arc<dyn CodecFactory> {
    Arc::new(TypedFactory::new(codec))
}

/// The built-in factories in registration order.
pub(crate) fn factories(config: &Config) -> Vec<Arc<dyn CodecFactory>> {
    let long = config.long_policy;
    let special = config.special_floats;
    vec![
        typed(StringCodec),
        typed(BoolCodec),
        typed(CharCodec),
        typed(IntCodec::<i8>::new()),
        typed(IntCodec::<i16>::new()),
        typed(IntCodec::<i32>::new()),
        typed(IntCodec::<u8>::new()),
        typed(IntCodec::<u16>::new()),
        typed(IntCodec::<u32>::new()),
        typed(LongCodec::<i64>::new(long)),
        typed(LongCodec::<u64>::new(long)),
        typed(LongCodec::<i128>::new(long)),
        typed(LongCodec::<u128>::new(long)),
        typed(F64Codec::new(special)),
        typed(F32Codec::new(special)),
        Arc::new(ListFactory) as Arc<dyn CodecFactory>,
    ]
}
