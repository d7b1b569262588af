//! The storage capability consumed by downloads and uploads.
//!
//! [`Transport`] is the only seam between the transfer engine and a remote
//! store. [`ObjectStoreTransport`] implements it on top of
//! [`object_store`] backends; [`MockTransport`] is an in-memory
//! implementation with failure injection for tests.

mod error;
#[cfg(any(test, feature = "test-utils"))]
mod mock;
mod store;

use bytes::Bytes;

pub use self::error::{ServiceError, TransportError};
#[cfg(any(test, feature = "test-utils"))]
pub use self::mock::{MockTransport, TransportCall};
pub use self::store::{BucketStore, ObjectStoreTransport};
use crate::types::{ByteRange, ObjectLocator, PartRecord, UploadSession};

/// Remote object storage operations used by the transfer engine.
///
/// Implementations must be safe for concurrent use: a single transport is
/// shared by every get and put issued through a client.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Returns the total size of the object in bytes.
    async fn head_object(&self, locator: &ObjectLocator) -> Result<u64, TransportError>;

    /// Returns exactly the bytes covered by `range`.
    async fn get_object_range(
        &self,
        locator: &ObjectLocator,
        range: ByteRange,
    ) -> Result<Bytes, TransportError>;

    /// Starts a multipart upload for `locator`.
    async fn create_multipart_upload(
        &self,
        locator: &ObjectLocator,
    ) -> Result<UploadSession, TransportError>;

    /// Uploads one part and returns its entity tag.
    async fn upload_part(
        &self,
        session: &UploadSession,
        part_number: u32,
        data: Bytes,
    ) -> Result<String, TransportError>;

    /// Assembles the uploaded parts into the final object.
    async fn complete_multipart_upload(
        &self,
        session: &UploadSession,
        parts: &[PartRecord],
    ) -> Result<(), TransportError>;

    /// Discards the upload and every part stored under it.
    async fn abort_multipart_upload(&self, session: &UploadSession) -> Result<(), TransportError>;
}
