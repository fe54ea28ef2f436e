//! Runtime identity of the types a registry can bind.

use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::record::{ErasedShape, Record, erase_shape};

/// Immutable, cheaply cloned identity of one concrete type instantiation.
///
/// Two descriptors are equal iff they carry the same [`TypeId`]; the name,
/// parameters and definition are derived data used for diagnostics and by
/// factories to decide whether they apply.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<Descriptor>);

struct Descriptor {
    id: TypeId,
    name: String,
    params: Vec<TypeDescriptor>,
    def: TypeDef,
}

/// What kind of type a descriptor denotes.
#[derive(Clone, Copy)]
pub enum TypeDef {
    /// A leaf value such as a number, a boolean or a string
    Scalar,
    /// A homogeneous sequence
    List(ListDef),
    /// A record with declared members
    Record(RecordDef),
    /// A type only a user-registered factory knows how to handle
    Opaque,
}

/// Type-erased access to the elements of a homogeneous list.
#[derive(Clone, Copy)]
pub struct ListDef {
    /// Borrow each element of the list
    pub items: fn(&dyn Any) -> Option<Vec<&dyn Any>>,
    /// Build the list from decoded elements
    pub collect: fn(Vec<Box<dyn Any>>) -> Option<Box<dyn Any>>,
}

/// Type-erased construction and shape of a record.
#[derive(Clone, Copy)]
pub struct RecordDef {
    /// Allocate a fresh instance
    pub construct: fn() -> Box<dyn Any>,
    /// Members of the record and its ancestors, most-derived first
    pub shape: fn() -> ErasedShape,
    /// First version the record exists in
    pub since: Option<f64>,
    /// First version the record no longer exists in
    pub until: Option<f64>,
}

impl TypeDescriptor {
    fn build<T: Any>(name: impl Into<String>, params: Vec<TypeDescriptor>, def: TypeDef) -> Self {
        TypeDescriptor(Arc::new(Descriptor {
            id: TypeId::of::<T>(),
            name: name.into(),
            params,
            def,
        }))
    }

    /// Descriptor for a leaf value type.
    pub fn scalar<T: Any>(name: &str) -> Self {
        Self::build::<T>(name, Vec::new(), TypeDef::Scalar)
    }

    /// Descriptor for a type that no built-in factory handles.
    pub fn opaque<T: Any>(name: &str) -> Self {
        Self::build::<T>(name, Vec::new(), TypeDef::Opaque)
    }

    /// Descriptor for `Vec<T>`.
    pub fn list<T: Describe>() -> Self {
        Self::build::<Vec<T>>(
            "Vec",
            vec![T::descriptor()],
            TypeDef::List(ListDef {
                items: list_items::<T>,
                collect: list_collect::<T>,
            }),
        )
    }

    /// Descriptor for a record type.
    pub fn record<R: Record>() -> Self {
        Self::build::<R>(
            R::NAME,
            R::type_params(),
            TypeDef::Record(RecordDef {
                construct: construct_boxed::<R>,
                shape: erase_shape::<R>,
                since: R::SINCE,
                until: R::UNTIL,
            }),
        )
    }

    /// The [`TypeId`] of the described type.
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    /// The bare type name, without parameters.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Resolved generic parameters, in declaration order.
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.0.params
    }

    /// The type definition.
    pub fn def(&self) -> TypeDef {
        self.0.def
    }

    /// True if this descriptor denotes `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.id == TypeId::of::<T>()
    }

    /// The record definition, if this is a record.
    pub fn as_record(&self) -> Option<RecordDef> {
        match self.0.def {
            TypeDef::Record(def) => Some(def),
            _ => None,
        }
    }

    /// The list definition, if this is a list.
    pub fn as_list(&self) -> Option<ListDef> {
        match self.0.def {
            TypeDef::List(def) => Some(def),
            _ => None,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)?;
        if let Some((first, rest)) = self.0.params.split_first() {
            write!(f, "<{first}")?;
            for p in rest {
                write!(f, ", {p}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self})")
    }
}

fn list_items<T: Describe>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    let list = value.downcast_ref::<Vec<T>>()?;
    Some(list.iter().map(|item| item as &dyn Any).collect())
}

fn list_collect<T: Describe>(items: Vec<Box<dyn Any>>) -> Option<Box<dyn Any>> {
    let list = items
        .into_iter()
        .map(|item| item.downcast::<T>().ok().map(|b| *b))
        .collect::<Option<Vec<T>>>()?;
    Some(Box::new(list))
}

fn construct_boxed<R: Record>() -> Box<dyn Any> {
    Box::new(R::construct())
}

/// Types that can describe themselves to a registry.
pub trait Describe: Any + Send + Sync {
    /// The descriptor for `Self`.
    fn descriptor() -> TypeDescriptor;
}

macro_rules! describe_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::scalar::<$ty>(stringify!($ty))
                }
            }
        )*
    };
}

describe_scalar!(
    bool, char, i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64, String
);

impl<T: Describe> Describe for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list::<T>()
    }
}

impl<R: Record> Describe for R {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::record::<R>()
    }
}
