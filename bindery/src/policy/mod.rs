//! Policies consulted while compiling binding tables.

mod exclusion;
mod naming;

pub use exclusion::{ExclusionStrategy, Excluder};
pub use naming::{FieldNaming, NamingPolicy};

use crate::descriptor::TypeDescriptor;
use crate::record::MemberMeta;

/// Which way a value travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Value to wire
    Serialize,
    /// Wire to value
    Deserialize,
}

/// Decides which members and types take part in (de)serialization.
pub trait InclusionPolicy: Send + Sync {
    /// Whether `member` is bound for `direction`.
    fn include_member(&self, member: &MemberMeta, direction: Direction) -> bool;

    /// Whether values of `ty` are processed at all for `direction`.
    fn include_type(&self, ty: &TypeDescriptor, direction: Direction) -> bool;
}
