use core::any::Any;
use core::ptr;
use std::sync::Arc;

use bindery_stream::{JsonReader, JsonWriter, Token};

use crate::codec::{Codec, CodecFactory};
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::record::BindingTable;
use crate::registry::Resolution;
use crate::trace;

/// Builds codecs for record types from their declared shapes.
///
/// Always the last registered factory; declines everything that is not a
/// record.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralCodecFactory;

impl CodecFactory for StructuralCodecFactory {
    fn try_create(
        &self,
        cx: &mut Resolution<'_>,
        ty: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>> {
        let Some(def) = ty.as_record() else {
            return Ok(None);
        };
        let table = BindingTable::build(cx, ty, def)?;
        Ok(Some(Arc::new(RecordCodec {
            ty: ty.clone(),
            construct: def.construct,
            table,
        })))
    }
}

struct RecordCodec {
    ty: TypeDescriptor,
    construct: fn() -> Box<dyn Any>,
    table: BindingTable,
}

/// True if `member` is the very object `owner` (same address, same type).
fn same_object(member: &dyn Any, owner: &dyn Any) -> bool {
    member.type_id() == owner.type_id()
        && ptr::addr_eq(member as *const dyn Any, owner as *const dyn Any)
}

impl Codec for RecordCodec {
    fn write(&self, out: &mut JsonWriter<'_>, value: Option<&dyn Any>) -> Result<()> {
        let Some(value) = value else {
            out.null_value()?;
            return Ok(());
        };
        if value.type_id() != self.ty.id() {
            return Err(Error::type_mismatch(
                self.ty.to_string(),
                "an instance of another type",
            ));
        }

        out.begin_object()?;
        for (name, binding) in self.table.iter() {
            let member = &binding.member;
            if !binding.primary || !member.serialize {
                continue;
            }
            let field = member.slot.get(value);
            if let Some(field) = field
                && same_object(field, value)
            {
                trace!(record = %self.ty, member = member.name, "skipping self reference");
                continue;
            }
            out.name(name)?;
            member.codec.write(out, field)?;
        }
        out.end_object()?;
        Ok(())
    }

    fn read(&self, input: &mut JsonReader<'_>) -> Result<Option<Box<dyn Any>>> {
        if input.peek()? == Token::Null {
            input.next_null()?;
            return Ok(None);
        }

        let mut instance = (self.construct)();
        input.begin_object()?;
        while input.has_next()? {
            let name = input.next_name()?;
            match self.table.get(&name) {
                Some(binding) if binding.member.deserialize => {
                    let member = &binding.member;
                    let value = member.codec.read(input)?;
                    member.slot.set(instance.as_mut(), value)?;
                }
                _ => {
                    trace!(record = %self.ty, name = %name, "skipping unbound name");
                    input.skip_value()?;
                }
            }
        }
        input.end_object()?;
        Ok(Some(instance))
    }
}
