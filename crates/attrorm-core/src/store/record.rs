//! On-disk encoding of a stored row.

use rkyv::{Archive, Deserialize, Serialize};

use super::item::Attributes;
use crate::error::StoreError;

/// A single name/value pair as stored.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StoredAttribute {
    pub name: String,
    pub value: String,
}

/// A stored row with its insertion sequence.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StoredRow {
    /// Sequence assigned on first insert; updates keep it so that query
    /// order stays the order rows were first written.
    pub seq: u64,

    /// Attribute values.
    pub attributes: Vec<StoredAttribute>,
}

impl StoredRow {
    /// Build a row from an attribute set.
    pub fn new(seq: u64, attributes: &Attributes) -> Self {
        Self {
            seq,
            attributes: attributes
                .iter()
                .map(|(name, value)| StoredAttribute {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    /// Convert back into an attribute set.
    pub fn into_attributes(self) -> Attributes {
        self.attributes
            .into_iter()
            .map(|a| (a.name, a.value))
            .collect()
    }

    /// Serialize the row to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize a row from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        // sled values carry no alignment guarantee.
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}
