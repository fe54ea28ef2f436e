//! Registry configuration.

use std::sync::Arc;

use bindery_stream::DEFAULT_MAX_DEPTH;

use crate::codec::CodecFactory;
use crate::policy::{Excluder, FieldNaming, NamingPolicy};
use crate::registry::CodecRegistry;

/// How 64- and 128-bit integers are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongPolicy {
    /// As JSON numbers
    #[default]
    Default,
    /// As JSON strings, for consumers that decode numbers as doubles
    String,
}

/// Options fixed when a [`CodecRegistry`] is built.
#[derive(Debug, Clone)]
pub struct Config {
    /// Emit members whose value is null (default: false)
    pub serialize_nulls: bool,

    /// Escape HTML-sensitive characters in strings (default: true)
    pub html_safe: bool,

    /// Indent output from [`CodecRegistry::new_writer`] (default: false)
    pub pretty: bool,

    /// Indent unit used when `pretty` is set (default: two spaces)
    pub indent: String,

    /// Readers from [`CodecRegistry::new_reader`] accept lenient syntax (default: false)
    pub lenient: bool,

    /// Arrays and objects that readers from [`CodecRegistry::new_reader`] may nest (default: 128)
    pub max_depth: usize,

    /// Prefix output with `)]}'` and a newline (default: false)
    pub non_executable: bool,

    /// Write NaN and infinities as bare literals instead of failing (default: false)
    pub special_floats: bool,

    /// Representation of 64- and 128-bit integers
    pub long_policy: LongPolicy,

    /// Wire names for members without an explicit rename
    pub naming: Arc<dyn NamingPolicy>,

    /// Member and type exclusion rules
    pub excluder: Excluder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serialize_nulls: false,
            html_safe: true,
            pretty: false,
            indent: "  ".to_string(),
            lenient: false,
            max_depth: DEFAULT_MAX_DEPTH,
            non_executable: false,
            special_floats: false,
            long_policy: LongPolicy::Default,
            naming: Arc::new(FieldNaming::Identity),
            excluder: Excluder::default(),
        }
    }
}

impl Config {
    /// Emit null members.
    pub fn serialize_nulls(mut self) -> Self {
        self.serialize_nulls = true;
        self
    }

    /// Leave HTML-sensitive characters unescaped.
    pub fn disable_html_escaping(mut self) -> Self {
        self.html_safe = false;
        self
    }

    /// Indent output by two spaces per level.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Indent output by `indent` per level.
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.pretty = true;
        self.indent = indent.into();
        self
    }

    /// Accept lenient syntax in readers created by the registry.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Reject input nested deeper than `max_depth` arrays and objects.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Prefix output with the non-executable guard.
    pub fn non_executable(mut self) -> Self {
        self.non_executable = true;
        self
    }

    /// Allow NaN and infinities.
    pub fn special_floats(mut self) -> Self {
        self.special_floats = true;
        self
    }

    /// Select how wide integers are written.
    pub fn long_policy(mut self, policy: LongPolicy) -> Self {
        self.long_policy = policy;
        self
    }

    /// Name members with `policy`.
    pub fn naming(mut self, policy: impl NamingPolicy + 'static) -> Self {
        self.naming = Arc::new(policy);
        self
    }

    /// Replace the exclusion rules.
    pub fn excluder(mut self, excluder: Excluder) -> Self {
        self.excluder = excluder;
        self
    }
}

/// Collects configuration and user factories, then builds an immutable registry.
#[derive(Default)]
pub struct RegistryBuilder {
    config: Config,
    factories: Vec<Arc<dyn CodecFactory>>,
}

impl RegistryBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Add a factory consulted after the excluder and before every built-in.
    ///
    /// Factories registered earlier take precedence.
    pub fn register(mut self, factory: impl CodecFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Freeze the factory list.
    pub fn build(self) -> CodecRegistry {
        CodecRegistry::from_parts(self.config, self.factories)
    }
}
