//! Multipart upload pipeline.
//!
//! A put opens a multipart session, re-chunks the input through a
//! [`PartBuffer`], uploads each part with [`PartUploader`] as soon as it
//! fills, and ends the session through [`UploadFinalizer`]: complete on
//! success, abort on any failure or cancellation before complete is issued.
//! A session never sees both calls.
//!
//! Everything runs on the caller's task; no background work is spawned.

mod finalizer;
mod part_buffer;
mod uploader;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

pub use self::finalizer::UploadFinalizer;
pub use self::part_buffer::{Part, PartBuffer};
pub use self::uploader::PartUploader;
use crate::TRACING_TARGET_UPLOAD;
use crate::cancel::until_cancelled;
use crate::client::PutOutput;
use crate::config::TransferConfig;
use crate::transport::Transport;
use crate::types::{Error, ObjectLocator, PartRecord, PutError, Result};

/// Uploads everything `reader` yields to `locator`.
///
/// `config` must already be validated.
#[tracing::instrument(
    target = TRACING_TARGET_UPLOAD,
    name = "upload.put",
    skip_all,
    fields(
        bucket = %locator.bucket,
        key = %locator.remote_key(),
        upload_id = tracing::field::Empty,
        parts = tracing::field::Empty,
        bytes = tracing::field::Empty,
    )
)]
pub(crate) async fn run<R>(
    transport: &dyn Transport,
    config: &TransferConfig,
    cancel: &CancellationToken,
    locator: &ObjectLocator,
    reader: R,
) -> Result<PutOutput, PutError>
where
    R: AsyncRead + Unpin,
{
    let session = until_cancelled(cancel, "upload", transport.create_multipart_upload(locator))
        .await
        .and_then(|created| {
            created.map_err(|source| Error::CreateUpload {
                locator: locator.clone(),
                source,
            })
        })
        .map_err(|err| PutError::new(0, err))?;

    let span = tracing::Span::current();
    span.record("upload_id", session.upload_id.as_str());

    // Both sizes are bounded by the validated configuration.
    let mut buffer = PartBuffer::new(
        reader,
        config.write_part_size as usize,
        config.read_increment as usize,
        config.max_parts,
    );
    let policy = config.retry_policy();
    let uploader = PartUploader::new(transport, &session, &policy);
    let finalizer = UploadFinalizer::new(transport, &session, config.abort_timeout());

    let uploaded = upload_parts(&mut buffer, &uploader, cancel).await;
    let bytes_written = buffer.total_read();
    span.record("bytes", bytes_written);

    let parts = match uploaded {
        Ok(parts) => parts,
        Err(cause) => return Err(PutError::new(bytes_written, finalizer.abort(cause).await)),
    };
    span.record("parts", parts.len());

    match finalizer.complete(cancel, &parts).await {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET_UPLOAD,
                bytes_written,
                parts = parts.len(),
                "multipart upload completed"
            );
            Ok(PutOutput {
                bytes_written,
                parts,
            })
        }
        Err(err) => {
            if err.is_cancelled() {
                tracing::warn!(
                    target: TRACING_TARGET_UPLOAD,
                    upload_id = %session.upload_id,
                    "cancelled while completing, remote outcome unknown"
                );
            }
            Err(PutError::new(bytes_written, err))
        }
    }
}

async fn upload_parts<R>(
    buffer: &mut PartBuffer<R>,
    uploader: &PartUploader<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<PartRecord>>
where
    R: AsyncRead + Unpin,
{
    let mut records = Vec::new();
    while let Some(part) = until_cancelled(cancel, "upload", buffer.next_part()).await?? {
        records.push(uploader.upload(cancel, part).await?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::transport::{MockTransport, TransportCall, TransportError};
    use crate::types::{ByteRange, UploadSession};

    /// Finishes the store-side complete, then stalls before answering.
    struct SlowComplete {
        inner: MockTransport,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl Transport for SlowComplete {
        async fn head_object(&self, locator: &ObjectLocator) -> Result<u64, TransportError> {
            self.inner.head_object(locator).await
        }

        async fn get_object_range(
            &self,
            locator: &ObjectLocator,
            range: ByteRange,
        ) -> Result<Bytes, TransportError> {
            self.inner.get_object_range(locator, range).await
        }

        async fn create_multipart_upload(
            &self,
            locator: &ObjectLocator,
        ) -> Result<UploadSession, TransportError> {
            self.inner.create_multipart_upload(locator).await
        }

        async fn upload_part(
            &self,
            session: &UploadSession,
            part_number: u32,
            data: Bytes,
        ) -> Result<String, TransportError> {
            self.inner.upload_part(session, part_number, data).await
        }

        async fn complete_multipart_upload(
            &self,
            session: &UploadSession,
            parts: &[PartRecord],
        ) -> Result<(), TransportError> {
            let result = self.inner.complete_multipart_upload(session, parts).await;
            tokio::time::sleep(self.delay).await;
            result
        }

        async fn abort_multipart_upload(
            &self,
            session: &UploadSession,
        ) -> Result<(), TransportError> {
            self.inner.abort_multipart_upload(session).await
        }
    }

    fn config(part_size: u64) -> TransferConfig {
        TransferConfig::new()
            .with_write_part_size(part_size)
            .with_read_increment(3)
            .with_retry_backoff_ms(0, 0)
    }

    fn aborts(transport: &MockTransport) -> usize {
        transport
            .calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::AbortMultipartUpload { .. }))
            .count()
    }

    fn completes(transport: &MockTransport) -> Vec<Vec<PartRecord>> {
        transport
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::CompleteMultipartUpload { parts, .. } => Some(parts),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn two_full_parts_complete_in_order() {
        let transport = MockTransport::new();
        let input = vec![9u8; 16];
        let locator = ObjectLocator::new("bucket", "doubled");

        let output = run(&transport, &config(8), &CancellationToken::new(), &locator, &input[..])
            .await
            .unwrap();

        assert_eq!(output.bytes_written, 16);
        assert_eq!(completes(&transport), vec![vec![
            PartRecord::new(1, "etag-1-8"),
            PartRecord::new(2, "etag-2-8"),
        ]]);
        assert_eq!(aborts(&transport), 0);
        assert_eq!(transport.object("bucket", "doubled").unwrap(), input);
    }

    #[tokio::test]
    async fn create_failure_reports_zero_bytes() {
        let transport = MockTransport::new();
        transport.fail_create();

        let err = run(
            &transport,
            &config(8),
            &CancellationToken::new(),
            &ObjectLocator::new("bucket", "key"),
            &b"abc"[..],
        )
        .await
        .unwrap_err();

        assert_eq!(err.bytes_written, 0);
        assert!(matches!(err.error, Error::CreateUpload { .. }));
        assert_eq!(aborts(&transport), 0);
    }

    #[tokio::test]
    async fn exhausted_retries_abort_the_session() {
        let transport = MockTransport::new();
        transport.fail_upload_part(5);

        let err = run(
            &transport,
            &config(8),
            &CancellationToken::new(),
            &ObjectLocator::new("bucket", "key"),
            &[1u8; 20][..],
        )
        .await
        .unwrap_err();

        assert!(matches!(err.error, Error::UploadPart { part_number: 1, attempts: 5, .. }));
        assert_eq!(err.bytes_written, 8);
        assert_eq!(aborts(&transport), 1);
        assert!(completes(&transport).is_empty());
        assert_eq!(transport.pending_uploads(), 0);
    }

    #[tokio::test]
    async fn ceiling_aborts_the_session() {
        let transport = MockTransport::new();
        let err = run(
            &transport,
            &config(4).with_max_parts(2),
            &CancellationToken::new(),
            &ObjectLocator::new("bucket", "key"),
            &[1u8; 9][..],
        )
        .await
        .unwrap_err();

        assert!(matches!(err.error, Error::TooManyParts { max_parts: 2, part_size: 4 }));
        assert_eq!(aborts(&transport), 1);
        assert!(completes(&transport).is_empty());
    }

    #[tokio::test]
    async fn failed_complete_skips_abort() {
        let transport = MockTransport::new();
        transport.fail_complete();

        let err = run(
            &transport,
            &config(8),
            &CancellationToken::new(),
            &ObjectLocator::new("bucket", "key"),
            &[1u8; 10][..],
        )
        .await
        .unwrap_err();

        assert!(matches!(err.error, Error::Finalize { .. }));
        assert_eq!(err.bytes_written, 10);
        assert_eq!(aborts(&transport), 0);
    }

    #[tokio::test]
    async fn failed_abort_keeps_the_original_error() {
        let transport = MockTransport::new();
        transport.fail_upload_part(5);
        transport.fail_abort();

        let err = run(
            &transport,
            &config(8),
            &CancellationToken::new(),
            &ObjectLocator::new("bucket", "key"),
            &[1u8; 4][..],
        )
        .await
        .unwrap_err();

        assert!(matches!(err.error, Error::Abort { .. }));
        assert!(matches!(err.error.abort_cause(), Some(Error::UploadPart { .. })));
    }

    #[tokio::test]
    async fn cancellation_while_waiting_for_input_aborts() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();
        let (mut writer, reader) = tokio::io::duplex(64);

        let trigger = cancel.clone();
        let producer = tokio::spawn(async move {
            writer.write_all(&[5u8; 10]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
            // Keep the stream open until the put gives up.
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(writer);
        });

        let err = run(
            &transport,
            &config(8),
            &cancel,
            &ObjectLocator::new("bucket", "key"),
            reader,
        )
        .await
        .unwrap_err();
        producer.await.unwrap();

        assert!(err.is_cancelled());
        assert_eq!(err.bytes_written, 10);
        assert_eq!(aborts(&transport), 1);
        assert!(completes(&transport).is_empty());
    }

    #[tokio::test]
    async fn cancellation_while_completing_skips_abort() {
        let transport = SlowComplete {
            inner: MockTransport::new(),
            delay: Duration::from_millis(500),
        };
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = run(
            &transport,
            &config(8),
            &cancel,
            &ObjectLocator::new("bucket", "key"),
            &[4u8; 10][..],
        )
        .await
        .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err.error, Error::Cancelled { .. }));
        assert_eq!(err.bytes_written, 10);
        assert_eq!(completes(&transport.inner).len(), 1);
        assert_eq!(aborts(&transport.inner), 0);
        assert_eq!(transport.inner.object("bucket", "key").unwrap(), vec![4u8; 10]);
    }
}
