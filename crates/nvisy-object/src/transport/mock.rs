//! In-memory [`Transport`] with call recording and failure injection.
//!
//! # Feature Flag
//!
//! Outside this crate's own tests the mock is only available when the
//! `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! nvisy-object = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use bytes::{Bytes, BytesMut};

use super::{Transport, TransportError};
use crate::types::{ByteRange, ObjectLocator, PartRecord, UploadSession};

/// One recorded call against a [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    HeadObject {
        key: String,
    },
    GetObjectRange {
        key: String,
        range: ByteRange,
    },
    CreateMultipartUpload {
        key: String,
    },
    UploadPart {
        upload_id: String,
        part_number: u32,
        size: usize,
    },
    CompleteMultipartUpload {
        upload_id: String,
        parts: Vec<PartRecord>,
    },
    AbortMultipartUpload {
        upload_id: String,
    },
}

#[derive(Debug, Default)]
struct PendingUpload {
    bucket: String,
    key: String,
    parts: BTreeMap<u32, Bytes>,
}

#[derive(Debug, Default)]
struct Failures {
    head: bool,
    create: bool,
    complete: bool,
    abort: bool,
    range_at: Option<usize>,
    upload_part: u32,
    upload_part_service: Option<(String, String)>,
}

#[derive(Debug, Default)]
struct MockState {
    objects: HashMap<(String, String), Bytes>,
    uploads: HashMap<String, PendingUpload>,
    next_upload_id: u64,
    range_calls: usize,
    calls: Vec<TransportCall>,
    failures: Failures,
}

/// Thread-safe in-memory object store that records every call.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    /// Creates an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object at `bucket`/`key` (the full remote key).
    #[must_use]
    pub fn with_object(self, bucket: &str, key: &str, data: impl Into<Bytes>) -> Self {
        self.insert_object(bucket, key, data);
        self
    }

    /// Seeds an object at `bucket`/`key` (the full remote key).
    pub fn insert_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Returns the stored object at `bucket`/`key`, if any.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Returns every call recorded so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Number of multipart uploads neither completed nor aborted.
    pub fn pending_uploads(&self) -> usize {
        self.lock().uploads.len()
    }

    /// Makes every head call fail.
    pub fn fail_head(&self) {
        self.lock().failures.head = true;
    }

    /// Makes every create-upload call fail.
    pub fn fail_create(&self) {
        self.lock().failures.create = true;
    }

    /// Makes every complete call fail.
    pub fn fail_complete(&self) {
        self.lock().failures.complete = true;
    }

    /// Makes every abort call fail.
    pub fn fail_abort(&self) {
        self.lock().failures.abort = true;
    }

    /// Makes the range fetch with zero-based call index `index` fail.
    pub fn fail_range_fetch(&self, index: usize) {
        self.lock().failures.range_at = Some(index);
    }

    /// Makes the next `times` part uploads fail with a generic error.
    pub fn fail_upload_part(&self, times: u32) {
        let mut state = self.lock();
        state.failures.upload_part = times;
        state.failures.upload_part_service = None;
    }

    /// Makes the next `times` part uploads fail with a service error.
    pub fn fail_upload_part_with_service(&self, times: u32, code: &str, message: &str) {
        let mut state = self.lock();
        state.failures.upload_part = times;
        state.failures.upload_part_service = Some((code.to_string(), message.to_string()));
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn injected(operation: &str) -> TransportError {
    TransportError::new(format!("injected {operation} failure"))
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn head_object(&self, locator: &ObjectLocator) -> Result<u64, TransportError> {
        let mut state = self.lock();
        let key = locator.remote_key();
        state.calls.push(TransportCall::HeadObject { key: key.clone() });

        if state.failures.head {
            return Err(injected("head"));
        }

        state
            .objects
            .get(&(locator.bucket.clone(), key))
            .map(|data| data.len() as u64)
            .ok_or_else(|| {
                TransportError::service("NoSuchKey", "the specified key does not exist")
                    .with_retryable(false)
            })
    }

    async fn get_object_range(
        &self,
        locator: &ObjectLocator,
        range: ByteRange,
    ) -> Result<Bytes, TransportError> {
        let mut state = self.lock();
        let key = locator.remote_key();
        state.calls.push(TransportCall::GetObjectRange {
            key: key.clone(),
            range,
        });

        let index = state.range_calls;
        state.range_calls += 1;
        if state.failures.range_at == Some(index) {
            return Err(injected("range fetch"));
        }

        let data = state
            .objects
            .get(&(locator.bucket.clone(), key))
            .ok_or_else(|| TransportError::service("NoSuchKey", "the specified key does not exist"))?;

        let start = range.start as usize;
        let end = (range.end as usize + 1).min(data.len());
        if start >= end {
            return Err(TransportError::service(
                "InvalidRange",
                "the requested range is not satisfiable",
            ));
        }
        Ok(data.slice(start..end))
    }

    async fn create_multipart_upload(
        &self,
        locator: &ObjectLocator,
    ) -> Result<UploadSession, TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::CreateMultipartUpload {
            key: locator.remote_key(),
        });

        if state.failures.create {
            return Err(injected("create upload"));
        }

        state.next_upload_id += 1;
        let session = UploadSession::new(locator, format!("upload-{}", state.next_upload_id));
        state.uploads.insert(session.upload_id.clone(), PendingUpload {
            bucket: session.bucket.clone(),
            key: session.key.clone(),
            parts: BTreeMap::new(),
        });
        Ok(session)
    }

    async fn upload_part(
        &self,
        session: &UploadSession,
        part_number: u32,
        data: Bytes,
    ) -> Result<String, TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::UploadPart {
            upload_id: session.upload_id.clone(),
            part_number,
            size: data.len(),
        });

        if state.failures.upload_part > 0 {
            state.failures.upload_part -= 1;
            return Err(match &state.failures.upload_part_service {
                Some((code, message)) => TransportError::service(code.clone(), message.clone()),
                None => injected("upload part"),
            });
        }

        let entity_tag = format!("etag-{part_number}-{}", data.len());
        let upload = state
            .uploads
            .get_mut(&session.upload_id)
            .ok_or_else(|| TransportError::service("NoSuchUpload", "unknown upload id"))?;
        upload.parts.insert(part_number, data);
        Ok(entity_tag)
    }

    async fn complete_multipart_upload(
        &self,
        session: &UploadSession,
        parts: &[PartRecord],
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::CompleteMultipartUpload {
            upload_id: session.upload_id.clone(),
            parts: parts.to_vec(),
        });

        if state.failures.complete {
            return Err(injected("complete"));
        }

        let upload = state
            .uploads
            .remove(&session.upload_id)
            .ok_or_else(|| TransportError::service("NoSuchUpload", "unknown upload id"))?;

        let mut object = BytesMut::new();
        for (expected, part) in (1u32..).zip(parts) {
            let data = upload
                .parts
                .get(&part.part_number)
                .filter(|_| part.part_number == expected)
                .ok_or_else(|| {
                    TransportError::service("InvalidPart", "parts must be dense and ascending")
                        .with_retryable(false)
                })?;
            if part.entity_tag != format!("etag-{}-{}", part.part_number, data.len()) {
                return Err(
                    TransportError::service("InvalidPart", "entity tag mismatch")
                        .with_retryable(false),
                );
            }
            object.extend_from_slice(data);
        }

        state
            .objects
            .insert((upload.bucket, upload.key), object.freeze());
        Ok(())
    }

    async fn abort_multipart_upload(&self, session: &UploadSession) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::AbortMultipartUpload {
            upload_id: session.upload_id.clone(),
        });

        if state.failures.abort {
            return Err(injected("abort"));
        }

        state.uploads.remove(&session.upload_id);
        Ok(())
    }
}
