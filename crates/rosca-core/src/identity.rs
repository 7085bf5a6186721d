//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers a circle deals in. They prevent
//! identifier confusion: an [`AssetId`] cannot be passed where an
//! [`AccountId`] is expected.

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::CanonicalizationError;

/// Quantity of a payment asset, in the asset's smallest unit.
pub type Amount = u128;

/// An account that can own circles, join them, and hold funds.
///
/// The empty string is the null identity. It is representable so that
/// definitions arriving from outside can be validated, but it is rejected
/// wherever a real participant is required.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null identity.
    pub fn null() -> Self {
        Self(String::new())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("<null>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a payment asset (token contract, currency code, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Content-addressed identifier of a circle.
///
/// Derived from the circle's defining name, so the same name always maps to
/// the same id. Serializes as the bare 64-character hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CircleId(ContentDigest);

/// Domain tag mixed into every circle id derivation.
const CIRCLE_ID_KIND: &str = "rosca.circle";

#[derive(Serialize)]
struct CircleIdPreimage<'a> {
    kind: &'static str,
    name: &'a str,
}

impl CircleId {
    /// Derive the id for a circle name.
    ///
    /// The preimage is the canonical encoding of
    /// `{"kind":"rosca.circle","name":<name>}`.
    pub fn derive(name: &str) -> Result<Self, CanonicalizationError> {
        let preimage = CircleIdPreimage {
            kind: CIRCLE_ID_KIND,
            name,
        };
        let canonical = CanonicalBytes::new(&preimage)?;
        Ok(Self(sha256_digest(&canonical)))
    }

    pub fn from_digest(digest: ContentDigest) -> Self {
        Self(digest)
    }

    pub fn digest(&self) -> &ContentDigest {
        &self.0
    }
}

impl std::fmt::Display for CircleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "circle:{}", self.0.to_hex())
    }
}

impl Serialize for CircleId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for CircleId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ContentDigest::from_hex(&hex)
            .map(Self)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid circle id: {hex:?}")))
    }
}
