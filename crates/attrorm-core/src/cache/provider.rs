//! Cache selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{Cache, MapCache, PassThroughCache};
use crate::error::ConfigError;

/// Which cache implementation a factory builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheKind {
    /// Caching disabled.
    #[default]
    PassThrough,
    /// Shared in-process map.
    Map,
}

impl CacheKind {
    /// Property value naming this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::PassThrough => "none",
            CacheKind::Map => "map",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "passthrough" | "pass-through" => Ok(CacheKind::PassThrough),
            "map" => Ok(CacheKind::Map),
            _ => Err(ConfigError::InvalidValue {
                key: "cacheFactory".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// The cache instance a factory threads through its sessions.
#[derive(Clone)]
pub enum CacheProvider {
    PassThrough(Arc<PassThroughCache>),
    Map(Arc<MapCache>),
}

impl CacheProvider {
    /// Build a fresh cache of the given kind.
    pub fn build(kind: CacheKind) -> Self {
        match kind {
            CacheKind::PassThrough => CacheProvider::PassThrough(Arc::new(PassThroughCache::new())),
            CacheKind::Map => CacheProvider::Map(Arc::new(MapCache::new())),
        }
    }

    /// The kind this provider was built from.
    pub fn kind(&self) -> CacheKind {
        match self {
            CacheProvider::PassThrough(_) => CacheKind::PassThrough,
            CacheProvider::Map(_) => CacheKind::Map,
        }
    }

    /// Shared handle for sessions.
    pub fn cache(&self) -> Arc<dyn Cache> {
        match self {
            CacheProvider::PassThrough(cache) => cache.clone(),
            CacheProvider::Map(cache) => cache.clone(),
        }
    }

    /// The map cache, for inspection.
    pub fn as_map(&self) -> Option<&Arc<MapCache>> {
        match self {
            CacheProvider::Map(cache) => Some(cache),
            CacheProvider::PassThrough(_) => None,
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.cache().clear();
    }
}

impl fmt::Debug for CacheProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheProvider").field(&self.kind()).finish()
    }
}
