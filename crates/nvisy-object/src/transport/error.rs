//! Error reported by a [`Transport`](super::Transport) call.

use std::fmt;

use crate::types::BoxedError;

/// Structured error returned by the remote storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// Service error code (e.g. `NoSuchKey`, `SlowDown`).
    pub code: String,
    /// Human-readable message from the service.
    pub message: String,
}

/// A lightweight transport error carrying a message, an optional structured
/// service error, an optional source, and a retryable flag.
pub struct TransportError {
    message: String,
    service: Option<ServiceError>,
    source: Option<BoxedError>,
    retryable: bool,
}

impl TransportError {
    /// Create a generic (retryable) transport error.
    pub fn new(msg: impl fmt::Display) -> Self {
        Self {
            message: msg.to_string(),
            service: None,
            source: None,
            retryable: true,
        }
    }

    /// Create an error reported by the remote service with a code and message.
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        let service = ServiceError {
            code: code.into(),
            message: message.into(),
        };
        Self {
            message: format!("remote error {}: {}", service.code, service.message),
            service: Some(service),
            source: None,
            retryable: true,
        }
    }

    /// Set whether the caller may retry this operation.
    #[must_use]
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Attach a source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The structured service error, if the remote store reported one.
    pub fn service_error(&self) -> Option<&ServiceError> {
        self.service.as_ref()
    }

    /// Whether the caller should retry this operation.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportError")
            .field("message", &self.message)
            .field("service", &self.service)
            .field("retryable", &self.retryable)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<object_store::Error> for TransportError {
    fn from(err: object_store::Error) -> Self {
        let code = match &err {
            object_store::Error::NotFound { .. } => Some("NotFound"),
            object_store::Error::PermissionDenied { .. } => Some("PermissionDenied"),
            object_store::Error::Unauthenticated { .. } => Some("Unauthenticated"),
            object_store::Error::AlreadyExists { .. } => Some("AlreadyExists"),
            object_store::Error::Precondition { .. } => Some("PreconditionFailed"),
            _ => None,
        };

        match code {
            Some(code) => Self::service(code, err.to_string())
                .with_retryable(false)
                .with_source(err),
            None => Self::new(err.to_string()).with_source(err),
        }
    }
}
