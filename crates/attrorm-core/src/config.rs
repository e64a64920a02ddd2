//! Session factory configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::CacheKind;
use crate::entity::DomainNaming;
use crate::error::ConfigError;
use crate::store::StoreConfig;

/// Recognized property names.
pub mod keys {
    /// Cache implementation: `none`, `passthrough` or `map`.
    pub const CACHE_FACTORY: &str = "cacheFactory";
    /// Directory of the sled store.
    pub const STORE_PATH: &str = "storePath";
    /// Use a temporary store deleted on shutdown.
    pub const STORE_TEMPORARY: &str = "storeTemporary";
    /// Store flush interval in milliseconds.
    pub const FLUSH_EVERY_MS: &str = "flushEveryMs";
    /// Store page cache capacity in bytes.
    pub const CACHE_CAPACITY: &str = "cacheCapacity";
    /// Log every store round trip at `info`.
    pub const PRINT_QUERIES: &str = "printQueries";
}

/// String property set, as loaded from a properties resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load properties from a JSON object of string values.
    ///
    /// A missing file is a configuration error, reported immediately.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let map: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self(map))
    }

    /// Add a property (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property, overriding any loaded value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Immutable configuration of a session factory.
#[derive(Debug, Clone, Default)]
pub struct FactoryConfig {
    /// Persistence-unit name; prefixes every domain when set.
    pub unit: Option<String>,

    /// Cache implementation shared by all sessions.
    pub cache: CacheKind,

    /// Store settings, used when no store is supplied to the builder.
    pub store: StoreConfig,

    /// Log every store round trip at `info` instead of `debug`.
    pub print_queries: bool,
}

impl FactoryConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration backed by a temporary store.
    pub fn temporary() -> Self {
        Self {
            store: StoreConfig::temporary(),
            ..Default::default()
        }
    }

    /// Build a configuration from properties. Unrecognized keys are ignored.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (key, value) in props.iter() {
            match key {
                keys::CACHE_FACTORY => config.cache = value.parse()?,
                keys::STORE_PATH => config.store.path = PathBuf::from(value),
                keys::STORE_TEMPORARY => config.store.temporary = parse_bool(key, value)?,
                keys::FLUSH_EVERY_MS => {
                    config.store.flush_every_ms = Some(parse_u64(key, value)?)
                }
                keys::CACHE_CAPACITY => config.store.cache_capacity = parse_u64(key, value)?,
                keys::PRINT_QUERIES => config.print_queries = parse_bool(key, value)?,
                _ => tracing::debug!(key, "ignoring unrecognized property"),
            }
        }

        Ok(config)
    }

    /// Set the persistence-unit name.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the cache implementation.
    pub fn with_cache(mut self, cache: CacheKind) -> Self {
        self.cache = cache;
        self
    }

    /// Set the store settings.
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Enable or disable query printing.
    pub fn with_print_queries(mut self, print: bool) -> Self {
        self.print_queries = print;
        self
    }

    /// Domain naming derived from the unit name.
    pub fn naming(&self) -> DomainNaming {
        match &self.unit {
            Some(unit) => DomainNaming::with_unit(unit.clone()),
            None => DomainNaming::plain(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
