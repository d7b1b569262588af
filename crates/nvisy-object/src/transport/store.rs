//! [`Transport`] backed by [`object_store`] backends (S3, Azure, GCS, memory).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use object_store::multipart::{MultipartStore, PartId};
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

use super::{Transport, TransportError};
use crate::TRACING_TARGET_TRANSPORT;
use crate::types::{ByteRange, ObjectLocator, PartRecord, UploadSession};

/// An [`ObjectStore`] that also exposes the low-level multipart API.
///
/// Implemented by every backend that supports ranged reads and explicit
/// multipart uploads (`AmazonS3`, `MicrosoftAzure`, `GoogleCloudStorage`,
/// `InMemory`).
pub trait BucketStore: ObjectStore + MultipartStore {}

impl<T: ObjectStore + MultipartStore> BucketStore for T {}

/// Routes transport calls to one registered store per bucket.
///
/// `object_store` backends are bound to a single bucket at build time, so the
/// bucket named in an [`ObjectLocator`] selects the backend.
#[derive(Clone, Default)]
pub struct ObjectStoreTransport {
    buckets: HashMap<String, Arc<dyn BucketStore>>,
}

impl ObjectStoreTransport {
    /// Creates a transport with no registered buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` as the backend for `bucket`.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>, store: impl BucketStore) -> Self {
        self.insert_bucket(bucket, Arc::new(store));
        self
    }

    /// Registers a shared `store` as the backend for `bucket`, replacing any
    /// previous registration.
    pub fn insert_bucket(&mut self, bucket: impl Into<String>, store: Arc<dyn BucketStore>) {
        self.buckets.insert(bucket.into(), store);
    }

    /// Returns the registered bucket names.
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    fn store(&self, bucket: &str) -> Result<&Arc<dyn BucketStore>, TransportError> {
        self.buckets.get(bucket).ok_or_else(|| {
            TransportError::service("NoSuchBucket", format!("bucket '{bucket}' is not registered"))
                .with_retryable(false)
        })
    }
}

impl fmt::Debug for ObjectStoreTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreTransport")
            .field("buckets", &self.buckets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait::async_trait]
impl Transport for ObjectStoreTransport {
    #[tracing::instrument(
        name = "transport.head",
        target = TRACING_TARGET_TRANSPORT,
        skip_all,
        fields(bucket = %locator.bucket, key = %locator.remote_key())
    )]
    async fn head_object(&self, locator: &ObjectLocator) -> Result<u64, TransportError> {
        let store = self.store(&locator.bucket)?;
        let meta = store.head(&Path::from(locator.remote_key())).await?;
        Ok(meta.size)
    }

    #[tracing::instrument(
        name = "transport.get_range",
        target = TRACING_TARGET_TRANSPORT,
        skip_all,
        fields(bucket = %locator.bucket, key = %locator.remote_key(), range = %range)
    )]
    async fn get_object_range(
        &self,
        locator: &ObjectLocator,
        range: ByteRange,
    ) -> Result<Bytes, TransportError> {
        let store = self.store(&locator.bucket)?;
        let path = Path::from(locator.remote_key());
        Ok(store.get_range(&path, range.as_range()).await?)
    }

    #[tracing::instrument(
        name = "transport.create_multipart",
        target = TRACING_TARGET_TRANSPORT,
        skip_all,
        fields(bucket = %locator.bucket, key = %locator.remote_key())
    )]
    async fn create_multipart_upload(
        &self,
        locator: &ObjectLocator,
    ) -> Result<UploadSession, TransportError> {
        let store = self.store(&locator.bucket)?;
        let upload_id = store
            .create_multipart(&Path::from(locator.remote_key()))
            .await?;
        Ok(UploadSession::new(locator, upload_id))
    }

    #[tracing::instrument(
        name = "transport.put_part",
        target = TRACING_TARGET_TRANSPORT,
        skip_all,
        fields(upload_id = %session.upload_id, part_number = part_number, size = data.len())
    )]
    async fn upload_part(
        &self,
        session: &UploadSession,
        part_number: u32,
        data: Bytes,
    ) -> Result<String, TransportError> {
        // object_store numbers parts from zero.
        let part_idx = part_number
            .checked_sub(1)
            .ok_or_else(|| TransportError::new("part numbers start at 1").with_retryable(false))?;

        let store = self.store(&session.bucket)?;
        let part = store
            .put_part(
                &Path::from(session.key.as_str()),
                &session.upload_id,
                part_idx as usize,
                PutPayload::from(data),
            )
            .await?;
        Ok(part.content_id)
    }

    #[tracing::instrument(
        name = "transport.complete_multipart",
        target = TRACING_TARGET_TRANSPORT,
        skip_all,
        fields(upload_id = %session.upload_id, parts = parts.len())
    )]
    async fn complete_multipart_upload(
        &self,
        session: &UploadSession,
        parts: &[PartRecord],
    ) -> Result<(), TransportError> {
        let store = self.store(&session.bucket)?;
        let parts = parts
            .iter()
            .map(|part| PartId {
                content_id: part.entity_tag.clone(),
            })
            .collect();
        store
            .complete_multipart(&Path::from(session.key.as_str()), &session.upload_id, parts)
            .await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "transport.abort_multipart",
        target = TRACING_TARGET_TRANSPORT,
        skip_all,
        fields(upload_id = %session.upload_id)
    )]
    async fn abort_multipart_upload(&self, session: &UploadSession) -> Result<(), TransportError> {
        let store = self.store(&session.bucket)?;
        store
            .abort_multipart(&Path::from(session.key.as_str()), &session.upload_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    fn test_transport() -> ObjectStoreTransport {
        ObjectStoreTransport::new().with_bucket("media", InMemory::new())
    }

    #[tokio::test]
    async fn multipart_then_ranged_read() {
        let transport = test_transport();
        let locator = ObjectLocator::new("media", "clip.bin").with_prefix("raw/");

        let session = transport.create_multipart_upload(&locator).await.unwrap();
        assert_eq!(session.key, "raw/clip.bin");

        let first = transport
            .upload_part(&session, 1, Bytes::from_static(b"hello "))
            .await
            .unwrap();
        let second = transport
            .upload_part(&session, 2, Bytes::from_static(b"world"))
            .await
            .unwrap();
        transport
            .complete_multipart_upload(&session, &[
                PartRecord::new(1, first),
                PartRecord::new(2, second),
            ])
            .await
            .unwrap();

        assert_eq!(transport.head_object(&locator).await.unwrap(), 11);
        let data = transport
            .get_object_range(&locator, ByteRange::with_size(6, 5))
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"world");
    }

    #[tokio::test]
    async fn unknown_bucket_is_not_retryable() {
        let transport = test_transport();
        let err = transport
            .head_object(&ObjectLocator::new("other", "a.bin"))
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        assert_eq!(
            err.service_error().map(|s| s.code.as_str()),
            Some("NoSuchBucket")
        );
    }

    #[tokio::test]
    async fn head_missing_object() {
        let transport = test_transport();
        let err = transport
            .head_object(&ObjectLocator::new("media", "missing.bin"))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn aborted_upload_leaves_no_object() {
        let transport = test_transport();
        let locator = ObjectLocator::new("media", "partial.bin");

        let session = transport.create_multipart_upload(&locator).await.unwrap();
        transport
            .upload_part(&session, 1, Bytes::from_static(b"partial"))
            .await
            .unwrap();
        transport.abort_multipart_upload(&session).await.unwrap();

        assert!(transport.head_object(&locator).await.is_err());
    }

    #[tokio::test]
    async fn rejects_part_number_zero() {
        let transport = test_transport();
        let locator = ObjectLocator::new("media", "zero.bin");
        let session = transport.create_multipart_upload(&locator).await.unwrap();

        let err = transport
            .upload_part(&session, 0, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
