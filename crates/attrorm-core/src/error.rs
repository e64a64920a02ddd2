//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an attribute store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The domain was never created, or has been deleted.
    #[error("no such domain: {0}")]
    NoSuchDomain(String),

    /// The backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while building a session factory from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The properties resource does not exist.
    #[error("{} not found. Could not initialize attrorm.", path.display())]
    NotFound { path: PathBuf },

    /// The properties resource exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The properties resource is not a JSON object of strings.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A recognized property carries a value that cannot be used.
    #[error("invalid value {value:?} for property {key}")]
    InvalidValue { key: String, value: String },
}

/// Errors raised while converting between an entity and its attributes.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A required attribute is absent from the row.
    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    /// An attribute is present but cannot be decoded.
    #[error("invalid attribute {name}: {reason}")]
    InvalidAttribute { name: String, reason: String },
}

/// Errors surfaced by sessions, lazy collections and the session factory.
#[derive(Debug, Error)]
pub enum Error {
    /// A store read failed while finding an entity or materializing a
    /// collection. The entity or collection is left as it was.
    #[error("failed to load {domain}/{key}: {source}")]
    Load {
        domain: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// A store write failed during persist or remove. The cache entry for
    /// the key is left untouched.
    #[error("failed to write {domain}/{key}: {source}")]
    Write {
        domain: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// A loaded row could not be mapped onto its entity type.
    #[error("failed to map {domain}/{key}: {source}")]
    Mapping {
        domain: String,
        key: String,
        #[source]
        source: MappingError,
    },

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store error outside of an entity read or write (domain bootstrap).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The session has been closed.
    #[error("session is closed")]
    SessionClosed,

    /// The session factory has been closed.
    #[error("session factory is closed")]
    FactoryClosed,

    /// The entity type was not registered with the session factory.
    #[error("entity type not registered: {0}")]
    UnregisteredEntity(&'static str),
}

impl Error {
    /// Check whether this is a store read failure.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::Load { .. })
    }

    /// Check whether this is a store write failure.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Error::Write { .. })
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias for store backends.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_the_path() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("/etc/attrorm.json"),
        };
        assert_eq!(
            err.to_string(),
            "/etc/attrorm.json not found. Could not initialize attrorm."
        );
    }

    #[test]
    fn test_failure_classification() {
        let load = Error::Load {
            domain: "Order".into(),
            key: "o1".into(),
            source: StoreError::Unavailable("down".into()),
        };
        assert!(load.is_load_failure());
        assert!(!load.is_write_failure());
        assert!(!Error::SessionClosed.is_load_failure());
    }
}
