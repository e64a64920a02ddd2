//! Store subcommands.

use attrorm_core::{AttributeStore, Attributes, CacheKind, StoreError};
use clap::{Subcommand, ValueEnum};
use thiserror::Error;

use crate::formatter::Formatter;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),

    /// Store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Session or factory failure.
    #[error(transparent)]
    Orm(#[from] attrorm_core::Error),
}

/// Subcommands operating on the store.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List domains
    Domains,

    /// Create a domain
    CreateDomain { domain: String },

    /// Delete a domain and all its rows
    DropDomain { domain: String },

    /// Insert or replace a row
    Put {
        domain: String,
        key: String,
        /// Attributes as name=value pairs
        #[arg(value_name = "NAME=VALUE")]
        attributes: Vec<String>,
    },

    /// Read a row by key
    Get { domain: String, key: String },

    /// Delete a row by key
    Delete { domain: String, key: String },

    /// List rows whose attribute equals a value, in insertion order
    Query {
        domain: String,
        attribute: String,
        value: String,
    },

    /// Run a parent/child scenario through sessions on a temporary store
    Demo {
        /// Cache implementation
        #[arg(long, default_value = "map", value_enum)]
        cache: CacheArg,
    },
}

/// Cache implementation selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheArg {
    /// No caching
    None,
    /// Shared in-process map
    Map,
}

impl From<CacheArg> for CacheKind {
    fn from(arg: CacheArg) -> Self {
        match arg {
            CacheArg::None => CacheKind::PassThrough,
            CacheArg::Map => CacheKind::Map,
        }
    }
}

/// Execute a store command and return formatted output.
pub fn execute(
    store: &dyn AttributeStore,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match command {
        Command::Domains => Ok(formatter.format_domains(&store.list_domains()?)),
        Command::CreateDomain { domain } => {
            store.create_domain(domain)?;
            Ok(formatter.format_message(&format!("created {}", domain)))
        }
        Command::DropDomain { domain } => {
            store.delete_domain(domain)?;
            Ok(formatter.format_message(&format!("dropped {}", domain)))
        }
        Command::Put {
            domain,
            key,
            attributes,
        } => {
            let attributes = parse_attributes(attributes)?;
            store.put(domain, key, &attributes)?;
            Ok(formatter.format_message(&format!("stored {}/{}", domain, key)))
        }
        Command::Get { domain, key } => match store.get(domain, key)? {
            Some(item) => Ok(formatter.format_items(domain, &[item])),
            None => Ok(formatter.format_message(&format!("{}/{} not found", domain, key))),
        },
        Command::Delete { domain, key } => {
            store.delete(domain, key)?;
            Ok(formatter.format_message(&format!("deleted {}/{}", domain, key)))
        }
        Command::Query {
            domain,
            attribute,
            value,
        } => {
            let items = store.query(domain, attribute, value)?;
            Ok(formatter.format_items(domain, &items))
        }
        Command::Demo { .. } => Err(CliError::Usage(
            "demo runs on its own temporary store".to_string(),
        )),
    }
}

/// Parse `name=value` pairs. Later pairs win.
pub fn parse_attributes(pairs: &[String]) -> Result<Attributes, CliError> {
    let mut attributes = Attributes::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| CliError::Usage(format!("expected NAME=VALUE, got '{}'", pair)))?;
        if name.is_empty() {
            return Err(CliError::Usage(format!("empty attribute name in '{}'", pair)));
        }
        attributes.insert(name, value);
    }
    Ok(attributes)
}
