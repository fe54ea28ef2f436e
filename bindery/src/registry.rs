//! Codec resolution, caching and the top-level encode/decode entry points.

use core::any::{Any, type_name};
use core::fmt;
use core::ptr;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;
use std::sync::Arc;

use bindery_stream::{JsonReader, JsonWriter, NON_EXECUTABLE_PREFIX, WriterOptions};
use parking_lot::RwLock;

use crate::builtin;
use crate::codec::{Codec, CodecFactory};
use crate::config::{Config, RegistryBuilder};
use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::{Error, Result};
use crate::placeholder::Placeholder;
use crate::policy::{Excluder, InclusionPolicy};
use crate::record::StructuralCodecFactory;
use crate::scoped::{ReaderOptionsGuard, WriterOptionsGuard};
use crate::{debug, trace};

/// Resolves type descriptors to codecs and memoizes the results.
///
/// The factory list is fixed when the registry is built:
///
/// 1. the [`Excluder`] from the configuration,
/// 2. user factories, in registration order,
/// 3. the built-in scalar and list factories,
/// 4. the [`StructuralCodecFactory`], always last.
///
/// A registry is meant to be built once and shared; resolution may run on
/// any number of threads at the same time.
pub struct CodecRegistry {
    factories: Vec<Arc<dyn CodecFactory>>,
    structural_index: usize,
    cache: RwLock<HashMap<TypeDescriptor, Arc<dyn Codec>>>,
    excluder: Arc<Excluder>,
    config: Config,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("factories", &self.factories.len())
            .field("cached", &self.cache_len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl CodecRegistry {
    /// A registry with `config` and no user factories.
    pub fn new(config: Config) -> Self {
        Self::from_parts(config, Vec::new())
    }

    /// Start building a registry with user factories.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_parts(config: Config, user: Vec<Arc<dyn CodecFactory>>) -> Self {
        let excluder = Arc::new(config.excluder.clone());
        let mut factories: Vec<Arc<dyn CodecFactory>> = Vec::with_capacity(user.len() + 16);
        factories.push(excluder.clone());
        factories.extend(user);
        factories.extend(builtin::factories(&config));
        let structural_index = factories.len();
        factories.push(Arc::new(StructuralCodecFactory));

        Self {
            factories,
            structural_index,
            cache: RwLock::new(HashMap::new()),
            excluder,
            config,
        }
    }

    /// The configuration this registry was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The member and type inclusion rules in effect.
    pub fn inclusion(&self) -> &dyn InclusionPolicy {
        &*self.excluder
    }

    /// The finished codec for `ty`, if one has been cached.
    pub fn cached(&self, ty: &TypeDescriptor) -> Option<Arc<dyn Codec>> {
        self.cache.read().get(ty).cloned()
    }

    /// Number of cached codecs.
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Resolve the codec for `ty`.
    ///
    /// Fails with [`ErrorKind::UnsupportedType`](crate::ErrorKind::UnsupportedType)
    /// if no factory accepts the type. Failures are never cached; a later
    /// call runs factory discovery again.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Codec>> {
        if let Some(codec) = self.cached(ty) {
            trace!(ty = %ty, "codec cache hit");
            return Ok(codec);
        }
        let mut cx = Resolution::new(self);
        let codec = cx.resolve(ty)?;
        cx.publish();
        Ok(self.cached(ty).unwrap_or(codec))
    }

    /// Resolve `ty` using only the factories registered after `pivot`.
    ///
    /// A `pivot` that is not registered (for example a per-member codec
    /// factory) counts as sitting just before the structural factory. The
    /// result is not cached under `ty`.
    pub fn resolve_skipping(
        &self,
        pivot: &dyn CodecFactory,
        ty: &TypeDescriptor,
    ) -> Result<Arc<dyn Codec>> {
        let mut cx = Resolution::new(self);
        let codec = cx.resolve_skipping(pivot, ty)?;
        cx.publish();
        Ok(codec)
    }

    fn position_after(&self, pivot: &dyn CodecFactory) -> usize {
        self.factories
            .iter()
            .position(|f| ptr::addr_eq(Arc::as_ptr(f), pivot as *const dyn CodecFactory))
            .map_or(self.structural_index, |index| index + 1)
    }

    fn publish(&self, finished: HashMap<TypeDescriptor, Arc<dyn Codec>>) {
        if finished.is_empty() {
            return;
        }
        let mut cache = self.cache.write();
        for (ty, codec) in finished {
            match cache.entry(ty) {
                Entry::Occupied(e) => {
                    trace!(ty = %e.key(), "codec resolved concurrently, keeping the first");
                }
                Entry::Vacant(e) => {
                    e.insert(codec);
                }
            }
        }
    }

    /// The typed codec for `T`.
    pub fn codec<T: Describe>(&self) -> Result<Arc<dyn Codec>> {
        self.resolve(&T::descriptor())
    }

    /// Encode `value` as `ty` onto `out`.
    ///
    /// For the duration of the call the writer is lenient and uses this
    /// registry's `html_safe` and `serialize_nulls` settings; its own
    /// settings are restored afterwards, also when encoding fails.
    pub fn serialize(
        &self,
        value: Option<&dyn Any>,
        ty: &TypeDescriptor,
        out: &mut JsonWriter<'_>,
    ) -> Result<()> {
        let codec = self.resolve(ty)?;
        let mut out = WriterOptionsGuard::new(
            out,
            WriterOptions {
                lenient: true,
                html_safe: self.config.html_safe,
                serialize_nulls: self.config.serialize_nulls,
            },
        );
        codec.write(&mut out, value)
    }

    /// Decode one value of `ty` from `input`.
    ///
    /// Returns `Ok(None)` both for an empty document and for a top-level
    /// `null`. Content left after the value is a syntax error.
    pub fn deserialize(
        &self,
        input: &mut JsonReader<'_>,
        ty: &TypeDescriptor,
    ) -> Result<Option<Box<dyn Any>>> {
        let value = {
            let mut input = ReaderOptionsGuard::new(input, true);
            if input.is_empty_document() {
                trace!(ty = %ty, "empty document");
                return Ok(None);
            }
            let codec = self.resolve(ty)?;
            codec.read(&mut input)?
        };
        input.expect_end()?;
        Ok(value)
    }

    /// A writer over `sink` configured from this registry.
    ///
    /// Writes the non-executable prefix right away when configured.
    pub fn new_writer<'w>(&self, sink: &'w mut dyn io::Write) -> Result<JsonWriter<'w>> {
        if self.config.non_executable {
            sink.write_all(NON_EXECUTABLE_PREFIX.as_bytes())?;
        }
        let mut writer = JsonWriter::new(sink);
        if self.config.pretty {
            writer.set_indent(&self.config.indent);
        }
        writer.set_options(WriterOptions {
            lenient: self.config.lenient,
            html_safe: self.config.html_safe,
            serialize_nulls: self.config.serialize_nulls,
        });
        Ok(writer)
    }

    /// A reader over `input` configured from this registry.
    pub fn new_reader<'a>(&self, input: &'a str) -> JsonReader<'a> {
        let mut reader = JsonReader::new(input);
        reader.set_lenient(self.config.lenient);
        reader.set_max_depth(self.config.max_depth);
        reader
    }

    /// Encode `value` to a string.
    pub fn to_string<T: Describe>(&self, value: &T) -> Result<String> {
        let mut buf = Vec::new();
        self.to_writer(value, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Encode `value` to `sink`.
    pub fn to_writer<T: Describe, W: io::Write>(&self, value: &T, mut sink: W) -> Result<()> {
        let mut out = self.new_writer(&mut sink)?;
        self.serialize(Some(value), &T::descriptor(), &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Decode a `T` from `json`.
    pub fn from_str<T: Describe>(&self, json: &str) -> Result<Option<T>> {
        let mut input = self.new_reader(json);
        let value = self.deserialize(&mut input, &T::descriptor())?;
        value
            .map(|v| {
                v.downcast::<T>()
                    .map(|v| *v)
                    .map_err(|_| Error::type_mismatch(type_name::<T>(), "a value of another type"))
            })
            .transpose()
    }

    /// Decode a `T` from everything `source` yields.
    pub fn from_reader<T: Describe, R: io::Read>(&self, mut source: R) -> Result<Option<T>> {
        let mut json = String::new();
        source.read_to_string(&mut json)?;
        self.from_str(&json)
    }
}

/// State of one top-level resolution call tree.
///
/// Owns the set of types whose resolution is in progress, each mapped to a
/// [`Placeholder`] that is handed out when resolution recurses back into
/// the type. Codecs finished within the call tree become visible to other
/// callers only once the top-level call succeeds.
pub struct Resolution<'r> {
    registry: &'r CodecRegistry,
    in_progress: HashMap<TypeDescriptor, Arc<Placeholder>>,
    finished: HashMap<TypeDescriptor, Arc<dyn Codec>>,
}

impl<'r> Resolution<'r> {
    fn new(registry: &'r CodecRegistry) -> Self {
        Self {
            registry,
            in_progress: HashMap::new(),
            finished: HashMap::new(),
        }
    }

    /// The registry being resolved against.
    pub fn registry(&self) -> &'r CodecRegistry {
        self.registry
    }

    /// Resolve `ty` within this call tree.
    ///
    /// If `ty` is already being resolved further up, its placeholder is
    /// returned instead of recursing.
    pub fn resolve(&mut self, ty: &TypeDescriptor) -> Result<Arc<dyn Codec>> {
        if let Some(codec) = self.registry.cached(ty) {
            trace!(ty = %ty, "codec cache hit");
            return Ok(codec);
        }
        if let Some(codec) = self.finished.get(ty) {
            return Ok(codec.clone());
        }
        if let Some(placeholder) = self.in_progress.get(ty) {
            trace!(ty = %ty, "cycle, returning placeholder");
            let codec: Arc<dyn Codec> = placeholder.clone();
            return Ok(codec);
        }

        let placeholder = Arc::new(Placeholder::new(ty.clone()));
        self.in_progress.insert(ty.clone(), placeholder);
        let created = self.create(ty, 0);
        let Some(placeholder) = self.in_progress.remove(ty) else {
            panic!("in-progress entry for `{ty}` vanished during its resolution");
        };

        let Some((index, codec)) = created? else {
            return Err(Error::unsupported(ty.to_string()));
        };
        placeholder.complete(codec.clone());
        debug!(ty = %ty, factory = index, "resolved codec");
        self.finished.insert(ty.clone(), codec.clone());
        Ok(codec)
    }

    /// Resolve `ty` using only the factories registered after `pivot`.
    ///
    /// See [`CodecRegistry::resolve_skipping`].
    pub fn resolve_skipping(
        &mut self,
        pivot: &dyn CodecFactory,
        ty: &TypeDescriptor,
    ) -> Result<Arc<dyn Codec>> {
        let start = self.registry.position_after(pivot);
        match self.create(ty, start)? {
            Some((index, codec)) => {
                trace!(ty = %ty, factory = index, "resolved codec after pivot");
                Ok(codec)
            }
            None => Err(Error::unsupported(ty.to_string())),
        }
    }

    /// First codec offered by the factories from `start` on, with its index.
    fn create(
        &mut self,
        ty: &TypeDescriptor,
        start: usize,
    ) -> Result<Option<(usize, Arc<dyn Codec>)>> {
        let registry = self.registry;
        for (index, factory) in registry.factories.iter().enumerate().skip(start) {
            if let Some(codec) = factory.try_create(self, ty)? {
                return Ok(Some((index, codec)));
            }
        }
        Ok(None)
    }

    fn publish(self) {
        self.registry.publish(self.finished);
    }
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("in_progress", &self.in_progress.keys().collect::<Vec<_>>())
            .field("finished", &self.finished.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug)]
    struct Unknown;

    #[test]
    fn structural_factory_is_last() {
        let registry = CodecRegistry::default();
        assert_eq!(registry.structural_index, registry.factories.len() - 1);
        let unregistered = StructuralCodecFactory;
        assert_eq!(registry.position_after(&unregistered), registry.structural_index);
        let excluder: &dyn CodecFactory = &*registry.excluder;
        assert_eq!(registry.position_after(excluder), 1);
    }

    #[test]
    fn unsupported_type_is_not_cached() {
        let registry = CodecRegistry::default();
        let ty = TypeDescriptor::opaque::<Unknown>("Unknown");
        let err = registry.resolve(&ty).err().unwrap();
        assert!(matches!(
            &err.kind,
            ErrorKind::UnsupportedType { type_name } if type_name == "Unknown"
        ));
        assert!(registry.cached(&ty).is_none());
        assert_eq!(registry.cache_len(), 0);
    }

    #[test]
    fn scalars_resolve_once() {
        let registry = CodecRegistry::default();
        let first = registry.codec::<String>().unwrap();
        let second = registry.codec::<String>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cache_len(), 1);
    }
}
