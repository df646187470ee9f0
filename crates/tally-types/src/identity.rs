use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque, stable key for one ledger owner.
///
/// The identity provider hands this over after authentication; Tally never
/// inspects it beyond requiring it to be non-empty. One key owns exactly one
/// ledger.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wrap a provider-supplied key. Surrounding whitespace is trimmed.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptyIdentityKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe digest of the key (64 hex characters).
    ///
    /// Keys are opaque and may contain path separators, so storage backends
    /// address documents by this digest rather than by the key itself.
    pub fn storage_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"tally-identity-v1:");
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize().as_bytes())
    }

    /// Short identifier (first 8 hex characters of the digest).
    pub fn short_id(&self) -> String {
        format!("id:{}", &self.storage_digest()[..8])
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({})", self.short_id())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

/// An authenticated ledger owner as seen by the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: IdentityKey,
    pub display_name: String,
}

impl Identity {
    pub fn new(key: IdentityKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
        }
    }
}
