use core::any::Any;
use std::sync::Arc;

use bindery_stream::{JsonReader, JsonWriter, Token};

use crate::codec::{Codec, CodecFactory};
use crate::descriptor::{ListDef, TypeDescriptor};
use crate::error::{Error, ErrorKind, Result};
use crate::registry::Resolution;

/// Builds codecs for homogeneous lists from their element codec.
///
/// The element codec is resolved through the registry, so element types
/// get whatever codec the registry would give them on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListFactory;

impl CodecFactory for ListFactory {
    fn try_create(
        &self,
        cx: &mut Resolution<'_>,
        ty: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>> {
        let (Some(def), Some(element_ty)) = (ty.as_list(), ty.params().first()) else {
            return Ok(None);
        };
        let element = cx.resolve(element_ty)?;
        Ok(Some(Arc::new(ListCodec {
            ty: ty.clone(),
            element_ty: element_ty.clone(),
            def,
            element,
        })))
    }
}

struct ListCodec {
    ty: TypeDescriptor,
    element_ty: TypeDescriptor,
    def: ListDef,
    element: Arc<dyn Codec>,
}

impl Codec for ListCodec {
    fn write(&self, out: &mut JsonWriter<'_>, value: Option<&dyn Any>) -> Result<()> {
        let Some(value) = value else {
            out.null_value()?;
            return Ok(());
        };
        let items = (self.def.items)(value)
            .ok_or_else(|| Error::type_mismatch(self.ty.to_string(), "a value of another type"))?;
        out.begin_array()?;
        for item in items {
            self.element.write(out, Some(item))?;
        }
        out.end_array()?;
        Ok(())
    }

    fn read(&self, input: &mut JsonReader<'_>) -> Result<Option<Box<dyn Any>>> {
        if input.peek()? == Token::Null {
            input.next_null()?;
            return Ok(None);
        }
        let mut items = Vec::new();
        input.begin_array()?;
        while input.has_next()? {
            let Some(item) = self.element.read(input)? else {
                return Err(Error::new(ErrorKind::UnexpectedNull {
                    expected: self.element_ty.to_string(),
                }));
            };
            items.push(item);
        }
        input.end_array()?;
        let list = (self.def.collect)(items)
            .ok_or_else(|| Error::type_mismatch(self.ty.to_string(), "elements of another type"))?;
        Ok(Some(list))
    }
}
