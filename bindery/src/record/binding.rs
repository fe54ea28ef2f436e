use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::codec::Codec;
use crate::descriptor::{RecordDef, TypeDescriptor};
use crate::error::{Error, ErrorKind, Result};
use crate::policy::{Direction, InclusionPolicy};
use crate::record::{ErasedMember, ErasedSlot};
use crate::registry::Resolution;
use crate::{debug, trace};

/// A member compiled against its codec and eligibility.
pub(crate) struct BoundMember {
    pub(crate) name: &'static str,
    pub(crate) serialize: bool,
    pub(crate) deserialize: bool,
    pub(crate) slot: Arc<dyn ErasedSlot>,
    pub(crate) codec: Arc<dyn Codec>,
}

/// One wire-name entry; aliases point at the same member with `primary` unset.
pub(crate) struct Binding {
    pub(crate) member: Arc<BoundMember>,
    pub(crate) primary: bool,
}

/// Wire name to member binding for one record type, in discovery order.
pub(crate) struct BindingTable {
    entries: IndexMap<String, Binding>,
}

impl BindingTable {
    /// Compile the binding table for the record `ty`.
    ///
    /// Member codecs are resolved through `cx`, so a member whose type is
    /// still being resolved receives a placeholder.
    pub(crate) fn build(
        cx: &mut Resolution<'_>,
        ty: &TypeDescriptor,
        def: RecordDef,
    ) -> Result<Self> {
        let registry = cx.registry();
        let policy = registry.inclusion();
        let naming = registry.config().naming.clone();
        let mut entries: IndexMap<String, Binding> = IndexMap::new();

        for ErasedMember { meta, slot } in (def.shape)().into_members() {
            let serialize = policy.include_member(&meta, Direction::Serialize);
            let deserialize = policy.include_member(&meta, Direction::Deserialize);
            if !serialize && !deserialize {
                trace!(record = %ty, member = meta.name(), "member excluded");
                continue;
            }

            let primary = match meta.rename() {
                Some(name) => name.to_string(),
                None => naming.translate(meta.name()),
            };
            let mut names = vec![primary];
            for alias in meta.aliases() {
                if !names.contains(alias) {
                    names.push(alias.clone());
                }
            }

            let member_ty = meta.ty();
            let codec = match meta.codec_override() {
                Some(factory) => factory
                    .try_create(cx, &member_ty)?
                    .ok_or_else(|| Error::unsupported(member_ty.to_string()))?,
                None => cx.resolve(&member_ty)?,
            };

            trace!(
                record = %ty,
                member = meta.name(),
                names = ?names,
                serialize,
                deserialize,
                "bound member"
            );

            let bound = Arc::new(BoundMember {
                name: meta.name(),
                serialize,
                deserialize,
                slot,
                codec,
            });
            for (i, name) in names.into_iter().enumerate() {
                match entries.entry(name) {
                    Entry::Occupied(e) => {
                        return Err(Error::new(ErrorKind::DuplicateWireName {
                            type_name: ty.to_string(),
                            name: e.key().clone(),
                        }));
                    }
                    Entry::Vacant(e) => {
                        e.insert(Binding {
                            member: bound.clone(),
                            primary: i == 0,
                        });
                    }
                }
            }
        }

        debug!(record = %ty, entries = entries.len(), "binding table complete");
        Ok(BindingTable { entries })
    }

    /// Look up a wire name (primary or alias).
    pub(crate) fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Entries in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of wire names, aliases included.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
