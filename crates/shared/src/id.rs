//! Common ID Types
//!
//! Type-safe wrappers around the 16-byte identifiers used on the realm
//! wire protocol. Identifiers are formatted and parsed as 32-character
//! lowercase hexadecimal strings.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of raw bytes in every protocol identifier
pub const ID_LENGTH: usize = 16;

/// Error when parsing an identifier from its hexadecimal form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// Input is not valid hexadecimal
    #[error("Identifier is not valid hexadecimal")]
    InvalidHex,

    /// Input decodes to the wrong number of bytes
    #[error("Identifier must be {expected} bytes (got {actual})")]
    WrongLength { expected: usize, actual: usize },
}

/// Generic typed 16-byte identifier
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type RealmId = Id<markers::Realm>;
/// ```
pub struct Id<T> {
    value: [u8; ID_LENGTH],
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random ID
    pub fn random() -> Self {
        let mut value = [0u8; ID_LENGTH];
        OsRng.fill_bytes(&mut value);
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Create from raw bytes
    pub fn from_bytes(value: [u8; ID_LENGTH]) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Parse from a 32-character hexadecimal string
    pub fn parse_hex(s: &str) -> Result<Self, IdParseError> {
        let decoded = hex::decode(s).map_err(|_| IdParseError::InvalidHex)?;
        let value: [u8; ID_LENGTH] =
            decoded
                .try_into()
                .map_err(|v: Vec<u8>| IdParseError::WrongLength {
                    expected: ID_LENGTH,
                    actual: v.len(),
                })?;
        Ok(Self::from_bytes(value))
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.value
    }

    /// Format as a lowercase hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.value)
    }
}

// Manual impls: derived Clone/Copy/etc. would require `T: Clone` even
// though `T` is only a marker.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_hex())
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(D::Error::custom)
    }
}

/// Marker types for different identifier kinds
pub mod markers {
    /// Marker for realm identifiers
    pub struct Realm;

    /// Marker for secret identifiers
    pub struct Secret;
}

/// A 16-byte identifier for a realm, unique within a configuration
pub type RealmId = Id<markers::Realm>;

/// A 16-byte identifier for a registered secret
pub type SecretId = Id<markers::Secret>;
