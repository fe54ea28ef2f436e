//! Declared shapes of record types.
//!
//! A record lists its members once, as typed accessor pairs, instead of
//! being introspected at runtime. The structural factory erases these
//! declarations into a [`ErasedShape`] and compiles them into a binding
//! table the first time the record's codec is resolved.

use core::any::{Any, type_name};
use core::fmt;
use std::sync::Arc;

use crate::codec::CodecFactory;
use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::{Error, Result};
use crate::trace;

mod binding;
mod factory;

pub(crate) use binding::BindingTable;
pub use factory::StructuralCodecFactory;

/// A composite type bound member by member.
///
/// ```
/// use bindery::{Member, Record, RecordShape};
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
///     label: Option<String>,
/// }
///
/// impl Record for Point {
///     const NAME: &'static str = "Point";
///
///     fn shape() -> RecordShape<Self> {
///         RecordShape::new()
///             .member(Member::required("x", |p: &Self| &p.x, |p| &mut p.x))
///             .member(Member::required("y", |p: &Self| &p.y, |p| &mut p.y))
///             .member(Member::nullable("label", |p: &Self| &p.label, |p| &mut p.label))
///     }
/// }
/// ```
pub trait Record: Default + Any + Send + Sync {
    /// Display name used in descriptors and errors.
    const NAME: &'static str;

    /// First version this record exists in.
    const SINCE: Option<f64> = None;

    /// First version this record no longer exists in.
    const UNTIL: Option<f64> = None;

    /// A fresh instance for decoding into.
    fn construct() -> Self {
        Self::default()
    }

    /// Own members, plus an optional ancestor.
    fn shape() -> RecordShape<Self>;

    /// Descriptors of the generic parameters of this instantiation.
    fn type_params() -> Vec<TypeDescriptor> {
        Vec::new()
    }
}

/// Per-direction exposure of a member when exposure is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expose {
    /// Member is written
    pub serialize: bool,
    /// Member is read
    pub deserialize: bool,
}

/// Declaration-time facts about one member.
#[derive(Clone)]
pub struct MemberMeta {
    name: &'static str,
    declared_in: &'static str,
    ty: fn() -> TypeDescriptor,
    rename: Option<String>,
    aliases: Vec<String>,
    transient: bool,
    expose: Option<Expose>,
    since: Option<f64>,
    until: Option<f64>,
    codec: Option<Arc<dyn CodecFactory>>,
}

impl MemberMeta {
    /// The declared member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the record that declares the member.
    pub fn declared_in(&self) -> &'static str {
        self.declared_in
    }

    /// Descriptor of the member's value type.
    pub fn ty(&self) -> TypeDescriptor {
        (self.ty)()
    }

    /// Explicit primary wire name.
    pub fn rename(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    /// Deserialize-only alternate wire names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Whether the member is marked transient.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Exposure flags, if the member was marked exposed.
    pub fn expose(&self) -> Option<Expose> {
        self.expose
    }

    /// First version the member exists in.
    pub fn since(&self) -> Option<f64> {
        self.since
    }

    /// First version the member no longer exists in.
    pub fn until(&self) -> Option<f64> {
        self.until
    }

    pub(crate) fn codec_override(&self) -> Option<&Arc<dyn CodecFactory>> {
        self.codec.as_ref()
    }
}

impl fmt::Debug for MemberMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMeta")
            .field("name", &self.name)
            .field("declared_in", &self.declared_in)
            .field("rename", &self.rename)
            .field("aliases", &self.aliases)
            .field("transient", &self.transient)
            .field("expose", &self.expose)
            .field("since", &self.since)
            .field("until", &self.until)
            .field("codec", &self.codec.is_some())
            .finish()
    }
}

/// Typed storage access for one member of `R`.
trait Slot<R>: Send + Sync {
    fn get<'a>(&self, owner: &'a R) -> Option<&'a dyn Any>;
    fn set(&self, owner: &mut R, value: Option<Box<dyn Any>>) -> Result<()>;
}

fn unbox<F: Any>(value: Box<dyn Any>) -> Result<F> {
    value
        .downcast::<F>()
        .map(|b| *b)
        .map_err(|_| Error::type_mismatch(type_name::<F>(), "a value of another type"))
}

struct Required<R, F> {
    get: fn(&R) -> &F,
    get_mut: fn(&mut R) -> &mut F,
}

impl<R: 'static, F: Describe> Slot<R> for Required<R, F> {
    fn get<'a>(&self, owner: &'a R) -> Option<&'a dyn Any> {
        Some((self.get)(owner) as &dyn Any)
    }

    fn set(&self, owner: &mut R, value: Option<Box<dyn Any>>) -> Result<()> {
        match value {
            // storage cannot represent absence
            None => {
                trace!(ty = type_name::<F>(), "dropping null for required member");
                Ok(())
            }
            Some(v) => {
                *(self.get_mut)(owner) = unbox::<F>(v)?;
                Ok(())
            }
        }
    }
}

struct Nullable<R, F> {
    get: fn(&R) -> &Option<F>,
    get_mut: fn(&mut R) -> &mut Option<F>,
}

impl<R: 'static, F: Describe> Slot<R> for Nullable<R, F> {
    fn get<'a>(&self, owner: &'a R) -> Option<&'a dyn Any> {
        (self.get)(owner).as_ref().map(|v| v as &dyn Any)
    }

    fn set(&self, owner: &mut R, value: Option<Box<dyn Any>>) -> Result<()> {
        *(self.get_mut)(owner) = value.map(unbox::<F>).transpose()?;
        Ok(())
    }
}

struct Boxed<R, F> {
    get: fn(&R) -> &Option<Box<F>>,
    get_mut: fn(&mut R) -> &mut Option<Box<F>>,
}

impl<R: 'static, F: Describe> Slot<R> for Boxed<R, F> {
    fn get<'a>(&self, owner: &'a R) -> Option<&'a dyn Any> {
        (self.get)(owner).as_deref().map(|v| v as &dyn Any)
    }

    fn set(&self, owner: &mut R, value: Option<Box<dyn Any>>) -> Result<()> {
        let value = match value {
            None => None,
            Some(v) => Some(v.downcast::<F>().map_err(|_| {
                Error::type_mismatch(type_name::<F>(), "a value of another type")
            })?),
        };
        *(self.get_mut)(owner) = value;
        Ok(())
    }
}

/// One declared member of `R`.
pub struct Member<R> {
    meta: MemberMeta,
    slot: Arc<dyn Slot<R>>,
}

impl<R: Record> Member<R> {
    fn with_slot<F: Describe>(name: &'static str, slot: Arc<dyn Slot<R>>) -> Self {
        Member {
            meta: MemberMeta {
                name,
                declared_in: R::NAME,
                ty: F::descriptor,
                rename: None,
                aliases: Vec::new(),
                transient: false,
                expose: None,
                since: None,
                until: None,
                codec: None,
            },
            slot,
        }
    }

    /// A member stored as a plain `F`; a decoded null leaves it untouched.
    pub fn required<F: Describe>(
        name: &'static str,
        get: fn(&R) -> &F,
        get_mut: fn(&mut R) -> &mut F,
    ) -> Self {
        Self::with_slot::<F>(name, Arc::new(Required { get, get_mut }))
    }

    /// A member stored as `Option<F>`.
    pub fn nullable<F: Describe>(
        name: &'static str,
        get: fn(&R) -> &Option<F>,
        get_mut: fn(&mut R) -> &mut Option<F>,
    ) -> Self {
        Self::with_slot::<F>(name, Arc::new(Nullable { get, get_mut }))
    }

    /// A member stored as `Option<Box<F>>`, typically a self-referential link.
    pub fn boxed<F: Describe>(
        name: &'static str,
        get: fn(&R) -> &Option<Box<F>>,
        get_mut: fn(&mut R) -> &mut Option<Box<F>>,
    ) -> Self {
        Self::with_slot::<F>(name, Arc::new(Boxed { get, get_mut }))
    }

    /// Use `primary` as the wire name instead of the naming policy's.
    pub fn rename(mut self, primary: impl Into<String>) -> Self {
        self.meta.rename = Some(primary.into());
        self
    }

    /// Also accept `name` when reading.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.meta.aliases.push(name.into());
        self
    }

    /// Mark the member transient.
    pub fn transient(mut self) -> Self {
        self.meta.transient = true;
        self
    }

    /// Mark the member exposed in the given directions.
    pub fn expose(mut self, serialize: bool, deserialize: bool) -> Self {
        self.meta.expose = Some(Expose {
            serialize,
            deserialize,
        });
        self
    }

    /// The member exists from version `version` on.
    pub fn since(mut self, version: f64) -> Self {
        self.meta.since = Some(version);
        self
    }

    /// The member no longer exists from version `version` on.
    pub fn until(mut self, version: f64) -> Self {
        self.meta.until = Some(version);
        self
    }

    /// Obtain this member's codec from `factory` rather than the registry.
    pub fn codec(mut self, factory: impl CodecFactory + 'static) -> Self {
        self.meta.codec = Some(Arc::new(factory));
        self
    }
}

trait ParentLink<R> {
    fn members(&self) -> Vec<ErasedMember>;
}

struct Link<R, P> {
    up: fn(&R) -> &P,
    up_mut: fn(&mut R) -> &mut P,
}

impl<R: Record, P: Record> ParentLink<R> for Link<R, P> {
    fn members(&self) -> Vec<ErasedMember> {
        erase_shape::<P>()
            .members
            .into_iter()
            .map(|m| ErasedMember {
                meta: m.meta,
                slot: Arc::new(Projected::<R, P> {
                    up: self.up,
                    up_mut: self.up_mut,
                    inner: m.slot,
                }),
            })
            .collect()
    }
}

/// Members of a record and, optionally, the ancestor it extends.
pub struct RecordShape<R> {
    members: Vec<Member<R>>,
    parent: Option<Box<dyn ParentLink<R>>>,
}

impl<R: Record> Default for RecordShape<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordShape<R> {
    /// A shape with no members and no ancestor.
    pub fn new() -> Self {
        RecordShape {
            members: Vec::new(),
            parent: None,
        }
    }

    /// Declare a member. Members are bound in declaration order.
    pub fn member(mut self, member: Member<R>) -> Self {
        self.members.push(member);
        self
    }

    /// Declare `P` as the ancestor, reached through the given accessors.
    ///
    /// The ancestor's members are bound after this record's own.
    pub fn extends<P: Record>(mut self, get: fn(&R) -> &P, get_mut: fn(&mut R) -> &mut P) -> Self {
        self.parent = Some(Box::new(Link {
            up: get,
            up_mut: get_mut,
        }));
        self
    }

    fn erase(self) -> ErasedShape {
        let mut members: Vec<ErasedMember> = self
            .members
            .into_iter()
            .map(|m| ErasedMember {
                meta: m.meta,
                slot: Arc::new(Owned { slot: m.slot }),
            })
            .collect();
        if let Some(parent) = self.parent {
            members.extend(parent.members());
        }
        ErasedShape { members }
    }
}

/// Type-erased member list of a record, most-derived members first.
pub struct ErasedShape {
    members: Vec<ErasedMember>,
}

impl ErasedShape {
    /// Metadata of every declared member, in binding order.
    pub fn members(&self) -> impl Iterator<Item = &MemberMeta> {
        self.members.iter().map(|m| &m.meta)
    }

    pub(crate) fn into_members(self) -> Vec<ErasedMember> {
        self.members
    }
}

pub(crate) fn erase_shape<R: Record>() -> ErasedShape {
    R::shape().erase()
}

pub(crate) struct ErasedMember {
    pub(crate) meta: MemberMeta,
    pub(crate) slot: Arc<dyn ErasedSlot>,
}

/// Member access against an owner of unknown static type.
pub(crate) trait ErasedSlot: Send + Sync {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;
    fn set(&self, owner: &mut dyn Any, value: Option<Box<dyn Any>>) -> Result<()>;
}

struct Owned<R> {
    slot: Arc<dyn Slot<R>>,
}

impl<R: Record> ErasedSlot for Owned<R> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        self.slot.get(owner.downcast_ref::<R>()?)
    }

    fn set(&self, owner: &mut dyn Any, value: Option<Box<dyn Any>>) -> Result<()> {
        let owner = owner
            .downcast_mut::<R>()
            .ok_or_else(|| Error::type_mismatch(R::NAME, "an instance of another type"))?;
        self.slot.set(owner, value)
    }
}

struct Projected<R, P> {
    up: fn(&R) -> &P,
    up_mut: fn(&mut R) -> &mut P,
    inner: Arc<dyn ErasedSlot>,
}

impl<R: Record, P: Record> ErasedSlot for Projected<R, P> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let parent = (self.up)(owner.downcast_ref::<R>()?);
        self.inner.get(parent)
    }

    fn set(&self, owner: &mut dyn Any, value: Option<Box<dyn Any>>) -> Result<()> {
        let owner = owner
            .downcast_mut::<R>()
            .ok_or_else(|| Error::type_mismatch(R::NAME, "an instance of another type"))?;
        self.inner.set((self.up_mut)(owner), value)
    }
}
