//! Error types for chunked transfers.

use std::io;

use super::{ByteRange, ObjectLocator};
use crate::transport::TransportError;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for all transfer operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for downloads and uploads.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The head lookup used to size a download failed.
    #[error("could not get metadata for object '{locator}'")]
    Metadata {
        locator: ObjectLocator,
        #[source]
        source: TransportError,
    },

    /// A ranged read failed; terminates the download in progress.
    #[error("could not fetch {range} of object '{locator}'")]
    RangeFetch {
        locator: ObjectLocator,
        range: ByteRange,
        #[source]
        source: TransportError,
    },

    /// The multipart upload could not be started.
    #[error("could not create multipart upload for '{locator}'")]
    CreateUpload {
        locator: ObjectLocator,
        #[source]
        source: TransportError,
    },

    /// The upload's input stream failed before EOF.
    #[error("could not read part {part_number} from source")]
    ReadSource {
        part_number: u32,
        #[source]
        source: io::Error,
    },

    /// The input needs more parts than the store accepts.
    #[error("content does not fit in {max_parts} parts of {part_size} bytes")]
    TooManyParts { max_parts: u32, part_size: u64 },

    /// A part upload failed on every attempt.
    #[error("could not upload part {part_number} after {attempts} attempts")]
    UploadPart {
        part_number: u32,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The complete call failed.
    #[error("could not complete multipart upload '{upload_id}'")]
    Finalize {
        upload_id: String,
        #[source]
        source: TransportError,
    },

    /// The abort call failed; `cause` is the failure that triggered it.
    #[error("could not abort multipart upload '{upload_id}' after: {cause}")]
    Abort {
        upload_id: String,
        cause: Box<Error>,
        #[source]
        source: TransportError,
    },

    /// The caller's cancellation token fired.
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A storage backend could not be built from its credentials.
    #[error("could not configure {provider} store")]
    Provider {
        provider: &'static str,
        #[source]
        source: TransportError,
    },
}

impl Error {
    /// Create a cancellation error for `operation`.
    pub fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns true if the operation was cancelled, including when a failed
    /// abort wraps the cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Abort { cause, .. } => cause.is_cancelled(),
            _ => false,
        }
    }

    /// Returns the error that triggered a failed abort, if this is one.
    pub fn abort_cause(&self) -> Option<&Error> {
        match self {
            Self::Abort { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Returns the underlying transport failure, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Metadata { source, .. }
            | Self::RangeFetch { source, .. }
            | Self::CreateUpload { source, .. }
            | Self::UploadPart { source, .. }
            | Self::Finalize { source, .. }
            | Self::Abort { source, .. }
            | Self::Provider { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A failed put together with the number of bytes consumed from the input
/// before the failure.
#[derive(Debug, thiserror::Error)]
#[error("upload stopped after {bytes_written} bytes")]
pub struct PutError {
    /// Bytes read from the input stream before the failure.
    pub bytes_written: u64,
    /// The failure itself.
    #[source]
    pub error: Error,
}

impl PutError {
    /// Creates a new put error.
    pub fn new(bytes_written: u64, error: Error) -> Self {
        Self {
            bytes_written,
            error,
        }
    }

    /// Returns true if the put was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.error.is_cancelled()
    }

    /// Discards the byte count and returns the underlying error.
    pub fn into_inner(self) -> Error {
        self.error
    }
}

impl From<PutError> for Error {
    fn from(err: PutError) -> Self {
        err.error
    }
}
