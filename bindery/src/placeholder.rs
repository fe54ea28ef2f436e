use core::any::Any;
use std::sync::{Arc, OnceLock};

use bindery_stream::{JsonReader, JsonWriter};

use crate::codec::Codec;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;

/// Forward reference to a codec whose resolution is still in progress.
///
/// Handed out when resolution recurses back into a type it is already
/// resolving. The delegate is installed exactly once, when the outer
/// resolution finishes, which always happens before any value is encoded or
/// decoded through the placeholder.
pub struct Placeholder {
    ty: TypeDescriptor,
    delegate: OnceLock<Arc<dyn Codec>>,
}

impl Placeholder {
    /// An empty placeholder for `ty`.
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            delegate: OnceLock::new(),
        }
    }

    /// Install the finished codec.
    ///
    /// # Panics
    ///
    /// If a delegate was already installed.
    pub fn complete(&self, codec: Arc<dyn Codec>) {
        if self.delegate.set(codec).is_err() {
            panic!("placeholder codec for `{}` completed twice", self.ty);
        }
    }

    /// Whether the delegate has been installed.
    pub fn is_complete(&self) -> bool {
        self.delegate.get().is_some()
    }

    fn delegate(&self) -> &Arc<dyn Codec> {
        self.delegate.get().unwrap_or_else(|| {
            panic!(
                "codec for `{}` used before its resolution completed",
                self.ty
            )
        })
    }
}

impl core::fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Placeholder")
            .field("ty", &self.ty)
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl Codec for Placeholder {
    fn write(&self, out: &mut JsonWriter<'_>, value: Option<&dyn Any>) -> Result<()> {
        self.delegate().write(out, value)
    }

    fn read(&self, input: &mut JsonReader<'_>) -> Result<Option<Box<dyn Any>>> {
        self.delegate().read(input)
    }
}
