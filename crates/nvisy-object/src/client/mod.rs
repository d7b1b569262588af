//! Get/Put facade over a [`Transport`].
//!
//! [`TransferClient`] is a thin, cloneable handle holding a shared transport
//! and a validated [`TransferConfig`]. Every call is independent: concurrent
//! gets and puts share nothing but the transport.

use std::num::NonZeroU64;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_CLIENT;
use crate::config::TransferConfig;
use crate::download::{self, ObjectReader};
use crate::transport::Transport;
use crate::types::{Error, ObjectLocator, PutError, Result};
use crate::upload;

mod put_output;

pub use put_output::PutOutput;

/// Cloneable handle for chunked transfers against one transport.
#[derive(Clone)]
pub struct TransferClient {
    transport: Arc<dyn Transport>,
    config: Arc<TransferConfig>,
    read_part_size: NonZeroU64,
}

impl TransferClient {
    /// Creates a client over `transport`.
    ///
    /// Fails with [`Error::InvalidConfig`] when `config` does not validate.
    pub fn new(transport: impl Transport, config: TransferConfig) -> Result<Self> {
        Self::from_arc(Arc::new(transport), config)
    }

    /// Creates a client over an already shared transport.
    pub fn from_arc(transport: Arc<dyn Transport>, config: TransferConfig) -> Result<Self> {
        config.validate()?;
        let read_part_size = NonZeroU64::new(config.read_part_size)
            .ok_or_else(|| Error::invalid_config("read part size must be positive"))?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            read_part_size = config.read_part_size,
            write_part_size = config.write_part_size,
            max_upload_attempts = config.max_upload_attempts,
            "created transfer client"
        );

        Ok(Self {
            transport,
            config: Arc::new(config),
            read_part_size,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Opens a streaming download of `locator`.
    ///
    /// Only the metadata probe can fail here. Range fetch failures and
    /// cancellation arrive later as the reader's final item.
    #[tracing::instrument(
        target = TRACING_TARGET_CLIENT,
        name = "client.get",
        skip_all,
        fields(bucket = %locator.bucket, key = %locator.remote_key())
    )]
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        locator: &ObjectLocator,
    ) -> Result<ObjectReader> {
        download::start(self.transport.clone(), cancel, locator, self.read_part_size)
            .await
            .inspect_err(|err| {
                tracing::error!(target: TRACING_TARGET_CLIENT, error = %err, "get failed");
            })
    }

    /// Uploads everything `reader` yields to `locator` as a multipart upload.
    ///
    /// On failure the returned [`PutError`] reports how many bytes were
    /// consumed from `reader` before the upload stopped.
    #[tracing::instrument(
        target = TRACING_TARGET_CLIENT,
        name = "client.put",
        skip_all,
        fields(bucket = %locator.bucket, key = %locator.remote_key())
    )]
    pub async fn put<R>(
        &self,
        cancel: &CancellationToken,
        locator: &ObjectLocator,
        reader: R,
    ) -> Result<PutOutput, PutError>
    where
        R: AsyncRead + Unpin,
    {
        upload::run(self.transport.as_ref(), &self.config, cancel, locator, reader)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET_CLIENT,
                    bytes_written = err.bytes_written,
                    error = %err.error,
                    "put failed"
                );
            })
    }
}

impl std::fmt::Debug for TransferClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::TryStreamExt;
    use object_store::memory::InMemory;
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::transport::{MockTransport, ObjectStoreTransport, TransportCall};
    use crate::types::PartRecord;

    const PART: u64 = 64;

    fn config() -> TransferConfig {
        TransferConfig::new()
            .with_write_part_size(PART)
            .with_read_increment(16)
            .with_retry_backoff_ms(0, 0)
            .with_read_part_size(48)
            .unwrap()
    }

    fn mock_client() -> (Arc<MockTransport>, TransferClient) {
        let transport = Arc::new(MockTransport::new());
        let client = TransferClient::from_arc(transport.clone(), config()).unwrap();
        (transport, client)
    }

    fn content(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    fn sha256(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    async fn download(client: &TransferClient, locator: &ObjectLocator) -> Vec<u8> {
        let reader = client.get(&CancellationToken::new(), locator).await.unwrap();
        let chunks: Vec<_> = reader.try_collect().await.unwrap();
        chunks.concat()
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

    fn aborts(transport: &MockTransport) -> usize {
        transport
            .calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::AbortMultipartUpload { .. }))
            .count()
    }

    const ROUND_TRIP_SIZES: [usize; 4] = [0, 10, PART as usize, 3 * PART as usize + 17];

    #[tokio::test]
    async fn round_trip_through_mock() {
        let (_, client) = mock_client();

        for size in ROUND_TRIP_SIZES {
            let input = content(size);
            let locator = ObjectLocator::new("bucket", format!("object-{size}")).with_prefix("rt/");

            let output = client
                .put(&CancellationToken::new(), &locator, &input[..])
                .await
                .unwrap();
            assert_eq!(output.bytes_written, size as u64);

            let fetched = download(&client, &locator).await;
            assert_eq!(sha256(&fetched), sha256(&input), "size {size}");
        }
    }

    #[tokio::test]
    async fn round_trip_through_object_store() {
        let transport = ObjectStoreTransport::new().with_bucket("bucket", InMemory::new());
        let client = TransferClient::new(transport, config()).unwrap();

        for size in ROUND_TRIP_SIZES {
            let input = content(size);
            let locator = ObjectLocator::new("bucket", format!("object-{size}"));

            client
                .put(&CancellationToken::new(), &locator, &input[..])
                .await
                .unwrap();

            let fetched = download(&client, &locator).await;
            assert_eq!(sha256(&fetched), sha256(&input), "size {size}");
        }
    }

    #[tokio::test]
    async fn part_numbers_are_dense() {
        let (transport, client) = mock_client();
        let output = client
            .put(
                &CancellationToken::new(),
                &ObjectLocator::new("bucket", "dense"),
                &content(5 * PART as usize + 1)[..],
            )
            .await
            .unwrap();

        let numbers: Vec<u32> = output.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, (1..=6).collect::<Vec<_>>());
        assert_eq!(completes(&transport), vec![output.parts]);
    }

    #[tokio::test]
    async fn two_part_input_yields_two_full_parts() {
        let (transport, client) = mock_client();
        client
            .put(
                &CancellationToken::new(),
                &ObjectLocator::new("bucket", "two"),
                &content(2 * PART as usize)[..],
            )
            .await
            .unwrap();

        let sizes: Vec<usize> = transport
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::UploadPart { size, .. } => Some(size),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![PART as usize, PART as usize]);

        let completes = completes(&transport);
        assert_eq!(completes.len(), 1);
        assert_eq!(
            completes[0].iter().map(|p| p.part_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn transient_part_failures_are_retried() {
        let (transport, client) = mock_client();
        transport.fail_upload_part(4);

        let input = content(PART as usize + 5);
        let locator = ObjectLocator::new("bucket", "flaky");
        client
            .put(&CancellationToken::new(), &locator, &input[..])
            .await
            .unwrap();

        assert_eq!(aborts(&transport), 0);
        assert_eq!(transport.object("bucket", "flaky").unwrap(), input);
    }

    #[tokio::test]
    async fn persistent_part_failure_aborts() {
        let (transport, client) = mock_client();
        transport.fail_upload_part_with_service(5, "InternalError", "we encountered an internal error");

        let err = client
            .put(
                &CancellationToken::new(),
                &ObjectLocator::new("bucket", "doomed"),
                &content(10)[..],
            )
            .await
            .unwrap_err();

        match &err.error {
            Error::UploadPart { attempts, source, .. } => {
                assert_eq!(*attempts, 5);
                assert_eq!(source.service_error().unwrap().code, "InternalError");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(aborts(&transport), 1);
        assert!(completes(&transport).is_empty());
        assert_eq!(transport.pending_uploads(), 0);
    }

    #[tokio::test]
    async fn part_ceiling_aborts() {
        let transport = Arc::new(MockTransport::new());
        let client =
            TransferClient::from_arc(transport.clone(), config().with_max_parts(3)).unwrap();

        let err = client
            .put(
                &CancellationToken::new(),
                &ObjectLocator::new("bucket", "huge"),
                &content(3 * PART as usize + 1)[..],
            )
            .await
            .unwrap_err();

        assert!(matches!(err.error, Error::TooManyParts { max_parts: 3, .. }));
        assert_eq!(err.bytes_written, 3 * PART + 1);
        assert_eq!(aborts(&transport), 1);
    }

    #[tokio::test]
    async fn cancelled_put_aborts() {
        let (transport, client) = mock_client();
        let cancel = CancellationToken::new();
        let (mut writer, reader) = tokio::io::duplex(1024);

        let trigger = cancel.clone();
        let producer = tokio::spawn(async move {
            writer.write_all(&content(PART as usize + 8)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(writer);
        });

        let err = client
            .put(&cancel, &ObjectLocator::new("bucket", "cancelled"), reader)
            .await
            .unwrap_err();
        producer.await.unwrap();

        assert!(err.is_cancelled());
        assert_eq!(aborts(&transport), 1);
        assert!(completes(&transport).is_empty());
        assert!(transport.object("bucket", "cancelled").is_none());
    }

    #[tokio::test]
    async fn get_of_missing_object_fails_eagerly() {
        let (_, client) = mock_client();
        let err = client
            .get(&CancellationToken::new(), &ObjectLocator::new("bucket", "nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Metadata { .. }));
    }

    #[tokio::test]
    async fn get_reports_metadata_failure() {
        let transport = Arc::new(MockTransport::new().with_object("bucket", "a", content(4)));
        transport.fail_head();
        let client = TransferClient::from_arc(transport.clone(), config()).unwrap();

        let err = client
            .get(&CancellationToken::new(), &ObjectLocator::new("bucket", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Metadata { .. }));
        assert!(err.transport_error().unwrap().is_retryable());
    }

    #[tokio::test]
    async fn get_uses_configured_range_size() {
        let transport = Arc::new(MockTransport::new().with_object("bucket", "ranged", content(100)));
        let client = TransferClient::from_arc(transport.clone(), config()).unwrap();

        let fetched = download(&client, &ObjectLocator::new("bucket", "ranged")).await;
        assert_eq!(fetched, content(100));

        let ranges: Vec<String> = transport
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::GetObjectRange { range, .. } => Some(range.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(ranges, vec!["bytes=0-47", "bytes=48-95", "bytes=96-99"]);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = TransferConfig::new().with_max_upload_attempts(0);
        let err = TransferClient::new(MockTransport::new(), config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
