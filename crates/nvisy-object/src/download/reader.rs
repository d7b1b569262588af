//! Background range fetching and the consumer-facing byte stream.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::RangePlan;
use crate::TRACING_TARGET_DOWNLOAD;
use crate::transport::{Transport, TransportError};
use crate::types::{ByteRange, Error, ObjectLocator, Result};

/// Ranges buffered between the fetch task and the consumer.
const HANDOFF_CAPACITY: usize = 1;

/// Forward-only byte stream over a remote object.
///
/// Items arrive one range at a time, in order. A failed range fetch is
/// delivered as the final `Err` item. Dropping the reader stops the
/// background fetch task.
#[must_use = "streams do nothing unless polled"]
pub struct ObjectReader {
    receiver: mpsc::Receiver<Result<Bytes>>,
    size: u64,
    bytes_read: u64,
    _guard: DropGuard,
}

impl ObjectReader {
    /// Spawns the fetch task for `plan` and returns the consumer side.
    pub(crate) fn spawn(
        transport: Arc<dyn Transport>,
        locator: ObjectLocator,
        plan: RangePlan,
        cancel: &CancellationToken,
    ) -> Self {
        let token = cancel.child_token();
        let (sender, receiver) = mpsc::channel(HANDOFF_CAPACITY);
        let size = plan.length();

        tokio::spawn(fetch_ranges(
            transport,
            locator,
            plan,
            token.clone(),
            sender,
        ));

        Self {
            receiver,
            size,
            bytes_read: 0,
            _guard: token.drop_guard(),
        }
    }

    /// Total object size reported by the metadata probe.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes yielded to the consumer so far.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Adapts the stream into an [`AsyncRead`].
    ///
    /// Stream errors surface as [`io::Error`]s whose inner error is the
    /// original [`Error`].
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin {
        StreamReader::new(self.map_err(io::Error::other))
    }
}

impl std::fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("size", &self.size)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

impl Stream for ObjectReader {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let item = ready!(this.receiver.poll_recv(cx));
        if let Some(Ok(chunk)) = &item {
            this.bytes_read += chunk.len() as u64;
        }
        Poll::Ready(item)
    }
}

#[tracing::instrument(
    target = TRACING_TARGET_DOWNLOAD,
    name = "download.fetch",
    skip_all,
    fields(bucket = %locator.bucket, key = %locator.remote_key(), ranges = plan.range_count())
)]
async fn fetch_ranges(
    transport: Arc<dyn Transport>,
    locator: ObjectLocator,
    plan: RangePlan,
    token: CancellationToken,
    sender: mpsc::Sender<Result<Bytes>>,
) {
    for range in plan {
        // The next range is fetched only once the previous one has been taken.
        // A closed channel means the reader was dropped.
        let Ok(permit) = sender.reserve().await else {
            return;
        };

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::cancelled("download")),
            result = transport.get_object_range(&locator, range) => {
                result.and_then(|data| check_length(range, data)).map_err(|source| {
                    Error::RangeFetch {
                        locator: locator.clone(),
                        range,
                        source,
                    }
                })
            }
        };

        let failed = match &result {
            Ok(data) => {
                tracing::trace!(
                    target: TRACING_TARGET_DOWNLOAD,
                    %range,
                    size = data.len(),
                    "fetched range"
                );
                false
            }
            Err(err) if err.is_cancelled() => {
                tracing::debug!(target: TRACING_TARGET_DOWNLOAD, %range, "download cancelled");
                true
            }
            Err(err) => {
                tracing::error!(target: TRACING_TARGET_DOWNLOAD, %range, error = %err, "range fetch failed");
                true
            }
        };

        permit.send(result);
        if failed {
            return;
        }
    }

    tracing::debug!(target: TRACING_TARGET_DOWNLOAD, "all ranges fetched");
}

fn check_length(range: ByteRange, data: Bytes) -> Result<Bytes, TransportError> {
    if data.len() as u64 == range.size() {
        return Ok(data);
    }
    Err(TransportError::new(format!(
        "expected {} bytes for {range}, received {}",
        range.size(),
        data.len()
    ))
    .with_retryable(false))
}
