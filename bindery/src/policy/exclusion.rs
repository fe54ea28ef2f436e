use core::any::Any;
use core::fmt;
use std::sync::Arc;

use bindery_stream::{JsonReader, JsonWriter};

use super::{Direction, InclusionPolicy};
use crate::codec::{Codec, CodecFactory};
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::record::MemberMeta;
use crate::registry::Resolution;
use crate::trace;

/// User-supplied rule for skipping members or whole types.
pub trait ExclusionStrategy: Send + Sync {
    /// Whether `member` is left out.
    fn skip_member(&self, member: &MemberMeta) -> bool {
        let _ = member;
        false
    }

    /// Whether values of `ty` are left out.
    fn skip_type(&self, ty: &TypeDescriptor) -> bool {
        let _ = ty;
        false
    }
}

/// The built-in inclusion policy.
///
/// Applies transient markers, version ranges, exposure flags and any
/// registered [`ExclusionStrategy`]. It is also the first factory of every
/// registry, so that types it excludes never reach another factory.
#[derive(Clone)]
pub struct Excluder {
    version: Option<f64>,
    skip_transient: bool,
    require_expose: bool,
    serialize_strategies: Vec<Arc<dyn ExclusionStrategy>>,
    deserialize_strategies: Vec<Arc<dyn ExclusionStrategy>>,
}

impl Default for Excluder {
    fn default() -> Self {
        Excluder {
            version: None,
            skip_transient: true,
            require_expose: false,
            serialize_strategies: Vec::new(),
            deserialize_strategies: Vec::new(),
        }
    }
}

impl fmt::Debug for Excluder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Excluder")
            .field("version", &self.version)
            .field("skip_transient", &self.skip_transient)
            .field("require_expose", &self.require_expose)
            .field("serialize_strategies", &self.serialize_strategies.len())
            .field("deserialize_strategies", &self.deserialize_strategies.len())
            .finish()
    }
}

impl Excluder {
    /// Only bind members and types valid at `version`.
    pub fn with_version(mut self, version: f64) -> Self {
        self.version = Some(version);
        self
    }

    /// Bind transient members too.
    pub fn keep_transient(mut self) -> Self {
        self.skip_transient = false;
        self
    }

    /// Only bind members marked with `expose`.
    pub fn require_expose(mut self) -> Self {
        self.require_expose = true;
        self
    }

    /// Consult `strategy` for the selected directions.
    pub fn with_strategy(
        mut self,
        strategy: impl ExclusionStrategy + 'static,
        serialize: bool,
        deserialize: bool,
    ) -> Self {
        let strategy: Arc<dyn ExclusionStrategy> = Arc::new(strategy);
        if serialize {
            self.serialize_strategies.push(strategy.clone());
        }
        if deserialize {
            self.deserialize_strategies.push(strategy);
        }
        self
    }

    fn strategies(&self, direction: Direction) -> &[Arc<dyn ExclusionStrategy>] {
        match direction {
            Direction::Serialize => &self.serialize_strategies,
            Direction::Deserialize => &self.deserialize_strategies,
        }
    }

    /// `since > version` or `until <= version` puts a declaration out of range.
    fn in_version(&self, since: Option<f64>, until: Option<f64>) -> bool {
        let Some(version) = self.version else {
            return true;
        };
        if since.is_some_and(|since| since > version) {
            return false;
        }
        if until.is_some_and(|until| until <= version) {
            return false;
        }
        true
    }
}

impl InclusionPolicy for Excluder {
    fn include_member(&self, member: &MemberMeta, direction: Direction) -> bool {
        if self.skip_transient && member.is_transient() {
            return false;
        }
        if !self.in_version(member.since(), member.until()) {
            return false;
        }
        if self.require_expose {
            let Some(expose) = member.expose() else {
                return false;
            };
            let exposed = match direction {
                Direction::Serialize => expose.serialize,
                Direction::Deserialize => expose.deserialize,
            };
            if !exposed {
                return false;
            }
        }
        if self.strategies(direction).iter().any(|s| s.skip_member(member)) {
            return false;
        }
        self.include_type(&member.ty(), direction)
    }

    fn include_type(&self, ty: &TypeDescriptor, direction: Direction) -> bool {
        if let Some(record) = ty.as_record()
            && !self.in_version(record.since, record.until)
        {
            return false;
        }
        !self.strategies(direction).iter().any(|s| s.skip_type(ty))
    }
}

impl CodecFactory for Excluder {
    fn try_create(
        &self,
        cx: &mut Resolution<'_>,
        ty: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>> {
        let serialize = self.include_type(ty, Direction::Serialize);
        let deserialize = self.include_type(ty, Direction::Deserialize);
        if serialize && deserialize {
            return Ok(None);
        }

        trace!(ty = %ty, serialize, deserialize, "type excluded");
        let delegate = if serialize || deserialize {
            Some(cx.resolve_skipping(self, ty)?)
        } else {
            None
        };
        Ok(Some(Arc::new(ExcludedCodec {
            serialize,
            deserialize,
            delegate,
        })))
    }
}

/// Codec for a type excluded in at least one direction.
struct ExcludedCodec {
    serialize: bool,
    deserialize: bool,
    delegate: Option<Arc<dyn Codec>>,
}

impl Codec for ExcludedCodec {
    fn write(&self, out: &mut JsonWriter<'_>, value: Option<&dyn Any>) -> Result<()> {
        match &self.delegate {
            Some(delegate) if self.serialize => delegate.write(out, value),
            _ => Ok(out.null_value()?),
        }
    }

    fn read(&self, input: &mut JsonReader<'_>) -> Result<Option<Box<dyn Any>>> {
        match &self.delegate {
            Some(delegate) if self.deserialize => delegate.read(input),
            _ => {
                input.skip_value()?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Describe;
    use crate::record::{Member, Record, RecordShape, erase_shape};

    #[derive(Default)]
    struct Account {
        id: u64,
        secret: String,
        nick: Option<String>,
        legacy: Option<String>,
        display: Option<String>,
    }

    impl Record for Account {
        const NAME: &'static str = "Account";

        fn shape() -> RecordShape<Self> {
            RecordShape::new()
                .member(Member::required("id", |a: &Self| &a.id, |a| &mut a.id).expose(true, true))
                .member(
                    Member::required("secret", |a: &Self| &a.secret, |a| &mut a.secret)
                        .transient(),
                )
                .member(
                    Member::nullable("nick", |a: &Self| &a.nick, |a| &mut a.nick)
                        .since(1.1)
                        .expose(false, true),
                )
                .member(
                    Member::nullable("legacy", |a: &Self| &a.legacy, |a| &mut a.legacy)
                        .until(1.0),
                )
                .member(Member::nullable(
                    "display",
                    |a: &Self| &a.display,
                    |a| &mut a.display,
                ))
        }
    }

    #[derive(Default)]
    struct NextGen;

    impl Record for NextGen {
        const NAME: &'static str = "NextGen";
        const SINCE: Option<f64> = Some(2.0);

        fn shape() -> RecordShape<Self> {
            RecordShape::new()
        }
    }

    fn included(excluder: &Excluder, direction: Direction) -> Vec<&'static str> {
        erase_shape::<Account>()
            .members()
            .filter(|m| excluder.include_member(m, direction))
            .map(|m| m.name())
            .collect()
    }

    struct SkipDisplay;

    impl ExclusionStrategy for SkipDisplay {
        fn skip_member(&self, member: &MemberMeta) -> bool {
            member.name() == "display"
        }
    }

    #[test]
    fn transient_members_are_skipped_by_default() {
        let excluder = Excluder::default();
        assert_eq!(
            included(&excluder, Direction::Serialize),
            ["id", "nick", "legacy", "display"]
        );
        let keep = Excluder::default().keep_transient();
        assert!(included(&keep, Direction::Serialize).contains(&"secret"));
    }

    #[test]
    fn version_bounds() {
        let v1 = Excluder::default().with_version(1.0);
        assert_eq!(included(&v1, Direction::Serialize), ["id", "display"]);

        let v2 = Excluder::default().with_version(1.1);
        assert_eq!(included(&v2, Direction::Serialize), ["id", "nick", "display"]);

        assert!(!v1.include_type(&NextGen::descriptor(), Direction::Serialize));
        let v20 = Excluder::default().with_version(2.0);
        assert!(v20.include_type(&NextGen::descriptor(), Direction::Serialize));
    }

    #[test]
    fn expose_is_per_direction() {
        let excluder = Excluder::default().require_expose();
        assert_eq!(included(&excluder, Direction::Serialize), ["id"]);
        assert_eq!(included(&excluder, Direction::Deserialize), ["id", "nick"]);
    }

    #[test]
    fn strategies_apply_to_their_direction_only() {
        let excluder = Excluder::default().with_strategy(SkipDisplay, true, false);
        assert!(!included(&excluder, Direction::Serialize).contains(&"display"));
        assert!(included(&excluder, Direction::Deserialize).contains(&"display"));
    }
}
