//! Completion and abort of a multipart session.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_UPLOAD;
use crate::cancel::until_cancelled;
use crate::transport::{Transport, TransportError};
use crate::types::{Error, PartRecord, Result, UploadSession};

/// Ends a multipart session with exactly one complete or abort call.
pub struct UploadFinalizer<'a> {
    transport: &'a dyn Transport,
    session: &'a UploadSession,
    abort_timeout: Duration,
}

impl<'a> UploadFinalizer<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        session: &'a UploadSession,
        abort_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            session,
            abort_timeout,
        }
    }

    /// Assembles `parts` into the final object.
    ///
    /// A failed complete becomes [`Error::Finalize`] and is not followed by an
    /// abort. Cancellation while the call is in flight returns
    /// [`Error::Cancelled`]; the remote outcome is then unknown and the
    /// session must not be aborted.
    pub async fn complete(&self, cancel: &CancellationToken, parts: &[PartRecord]) -> Result<()> {
        until_cancelled(
            cancel,
            "upload",
            self.transport.complete_multipart_upload(self.session, parts),
        )
        .await?
        .map_err(|source| {
            tracing::error!(
                target: TRACING_TARGET_UPLOAD,
                upload_id = %self.session.upload_id,
                error = %source,
                "could not complete multipart upload"
            );
            Error::Finalize {
                upload_id: self.session.upload_id.clone(),
                source,
            }
        })
    }

    /// Discards the session after `cause` and returns the error to surface.
    ///
    /// The abort ignores the caller's cancellation token so a cancelled put
    /// still cleans up, but is bounded by the abort timeout. When the abort
    /// fails the result is [`Error::Abort`] carrying both failures.
    pub async fn abort(&self, cause: Error) -> Error {
        tracing::warn!(
            target: TRACING_TARGET_UPLOAD,
            upload_id = %self.session.upload_id,
            cause = %cause,
            "aborting multipart upload"
        );

        let outcome = tokio::time::timeout(
            self.abort_timeout,
            self.transport.abort_multipart_upload(self.session),
        )
        .await
        .unwrap_or_else(|_| {
            Err(TransportError::new(format!(
                "abort timed out after {}s",
                self.abort_timeout.as_secs()
            )))
        });

        match outcome {
            Ok(()) => cause,
            Err(source) => {
                tracing::error!(
                    target: TRACING_TARGET_UPLOAD,
                    upload_id = %self.session.upload_id,
                    error = %source,
                    "could not abort multipart upload"
                );
                Error::Abort {
                    upload_id: self.session.upload_id.clone(),
                    cause: Box::new(cause),
                    source,
                }
            }
        }
    }
}
