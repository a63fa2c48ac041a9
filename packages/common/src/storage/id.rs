use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// An opaque blob identifier, assigned by the store at write time.
///
/// Identifiers are UUIDv7, so they sort roughly by creation time, but callers
/// must treat them as opaque: two blobs with identical content get distinct
/// identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(Uuid);

impl BlobId {
    /// Assign a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        Uuid::from_str(s)
            .map(Self)
            .map_err(|e| StorageError::InvalidId(e.to_string()))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Return the first 2 hex characters (shard prefix for filesystem layout).
    pub fn shard_prefix(&self) -> String {
        self.0.simple().to_string()[..2].to_string()
    }

    /// Return the remaining 30 hex characters (filename within shard).
    pub fn shard_suffix(&self) -> String {
        self.0.simple().to_string()[2..].to_string()
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BlobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
