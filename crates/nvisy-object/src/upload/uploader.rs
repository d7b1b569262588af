//! Part upload with bounded retry.

use tokio_util::sync::CancellationToken;

use super::Part;
use crate::TRACING_TARGET_UPLOAD;
use crate::retry::RetryPolicy;
use crate::transport::Transport;
use crate::types::{Error, PartRecord, Result, UploadSession};

/// Uploads parts of one multipart session.
pub struct PartUploader<'a> {
    transport: &'a dyn Transport,
    session: &'a UploadSession,
    policy: &'a RetryPolicy,
}

impl<'a> PartUploader<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        session: &'a UploadSession,
        policy: &'a RetryPolicy,
    ) -> Self {
        Self {
            transport,
            session,
            policy,
        }
    }

    /// Uploads `part`, retrying every failure until the policy runs out.
    ///
    /// On exhaustion the last transport error is kept in
    /// [`Error::UploadPart`], including any remote service code.
    #[tracing::instrument(
        target = TRACING_TARGET_UPLOAD,
        name = "upload.part",
        skip_all,
        fields(part_number = part.number, size = part.data.len())
    )]
    pub async fn upload(&self, cancel: &CancellationToken, part: Part) -> Result<PartRecord> {
        let number = part.number;
        let entity_tag = self
            .policy
            .retry(cancel, |_| {
                self.transport
                    .upload_part(self.session, number, part.data.clone())
            })
            .await
            .map_err(|failure| {
                failure.into_error("upload", |attempts, source| {
                    match source.service_error() {
                        Some(service) => tracing::error!(
                            target: TRACING_TARGET_UPLOAD,
                            attempts,
                            code = %service.code,
                            message = %service.message,
                            "part upload rejected by remote service"
                        ),
                        None => tracing::error!(
                            target: TRACING_TARGET_UPLOAD,
                            attempts,
                            error = %source,
                            "part upload failed"
                        ),
                    }
                    Error::UploadPart {
                        part_number: number,
                        attempts,
                        source,
                    }
                })
            })?;

        Ok(PartRecord::new(number, entity_tag))
    }
}
