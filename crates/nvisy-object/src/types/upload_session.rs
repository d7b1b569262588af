//! Handle for one in-flight multipart upload.

use serde::{Deserialize, Serialize};

use super::ObjectLocator;

/// Identifies one multipart upload on the remote store.
///
/// Lives for the duration of a single put and is terminated by exactly one
/// complete or abort call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    /// Bucket the upload targets.
    pub bucket: String,
    /// Full remote key (`prefix + key`).
    pub key: String,
    /// Store-assigned upload identifier.
    pub upload_id: String,
}

impl UploadSession {
    /// Creates a session for `locator` with the store-assigned `upload_id`.
    pub fn new(locator: &ObjectLocator, upload_id: impl Into<String>) -> Self {
        Self {
            bucket: locator.bucket.clone(),
            key: locator.remote_key(),
            upload_id: upload_id.into(),
        }
    }
}
