#![warn(missing_docs)]
//! Registry-driven JSON binding.
//!
//! A [`CodecRegistry`] holds an ordered, fixed list of [`CodecFactory`]s
//! and resolves [`TypeDescriptor`]s to [`Codec`]s, caching every finished
//! codec. Types that refer back to themselves resolve through a
//! [`Placeholder`] that is completed once the outer resolution finishes.
//!
//! Records describe their members explicitly; the [`StructuralCodecFactory`]
//! compiles that description into a wire-name binding table.
//!
//! ```
//! use bindery::{CodecRegistry, Member, Record, RecordShape};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: Option<String>,
//! }
//!
//! impl Record for Point {
//!     const NAME: &'static str = "Point";
//!
//!     fn shape() -> RecordShape<Self> {
//!         RecordShape::new()
//!             .member(Member::required("x", |p: &Self| &p.x, |p| &mut p.x))
//!             .member(Member::required("y", |p: &Self| &p.y, |p| &mut p.y))
//!             .member(Member::nullable("label", |p: &Self| &p.label, |p| &mut p.label).alias("name"))
//!     }
//! }
//!
//! let registry = CodecRegistry::default();
//! let json = registry.to_string(&Point { x: 1, y: 2, label: None }).unwrap();
//! assert_eq!(json, r#"{"x":1,"y":2}"#);
//!
//! let p: Point = registry.from_str(r#"{"x":3,"name":"c"}"#).unwrap().unwrap();
//! assert_eq!(p, Point { x: 3, y: 0, label: Some("c".into()) });
//! ```

/// Trace-level logging macro that forwards to `tracing::trace!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Trace-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Debug-level logging macro that forwards to `tracing::debug!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Debug-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use debug;
#[allow(unused_imports)]
pub(crate) use trace;

pub mod builtin;
mod codec;
mod config;
mod descriptor;
mod error;
mod placeholder;
pub mod policy;
mod record;
mod registry;
mod scoped;

pub use codec::{Codec, CodecFactory, NullSafe, TypedCodec};
pub use config::{Config, LongPolicy, RegistryBuilder};
pub use descriptor::{Describe, ListDef, RecordDef, TypeDef, TypeDescriptor};
pub use error::{Error, ErrorKind, Result};
pub use placeholder::Placeholder;
pub use policy::{Direction, ExclusionStrategy, Excluder, FieldNaming, InclusionPolicy, NamingPolicy};
pub use record::{ErasedShape, Expose, Member, MemberMeta, Record, RecordShape, StructuralCodecFactory};
pub use registry::{CodecRegistry, Resolution};
pub use scoped::{ReaderOptionsGuard, WriterOptionsGuard};

pub use bindery_stream::{JsonReader, JsonWriter, StreamError, StreamErrorKind, Token, WriterOptions};
