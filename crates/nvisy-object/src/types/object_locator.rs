//! Remote object identity.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifies one remote object: a bucket plus a key under an optional prefix.
///
/// The remote key is `prefix + key`; no separator is inserted, so a prefix
/// meant as a directory should end with `/`.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display("{bucket}/{prefix}{key}")]
#[serde(rename_all = "camelCase")]
pub struct ObjectLocator {
    /// Key prefix prepended verbatim to `key`.
    #[serde(default)]
    pub prefix: String,
    /// Bucket (or container) holding the object.
    pub bucket: String,
    /// Object key relative to `prefix`.
    pub key: String,
}

impl ObjectLocator {
    /// Creates a locator without a prefix.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the full remote key (`prefix + key`).
    pub fn remote_key(&self) -> String {
        format!("{}{}", self.prefix, self.key)
    }
}
