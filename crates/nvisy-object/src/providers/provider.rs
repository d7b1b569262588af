//! Provider trait for building bucket-bound stores from credentials.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::TRACING_TARGET_TRANSPORT;
use crate::transport::{BucketStore, ObjectStoreTransport};
use crate::types::Error;

/// Factory for a storage backend bound to one bucket (or container).
///
/// Implementations turn strongly-typed credentials into a [`BucketStore`]
/// that [`ObjectStoreTransport`] routes calls to.
pub trait Provider: Send + Sync + 'static {
    /// Strongly-typed credentials for this provider.
    type Credentials: DeserializeOwned + Send + Sync;

    /// Unique identifier (e.g. "s3", "azure").
    const ID: &'static str;

    /// Name of the bucket the built store is bound to.
    fn bucket(creds: &Self::Credentials) -> &str;

    /// Build the store. No network traffic happens here.
    fn build(creds: &Self::Credentials) -> Result<Arc<dyn BucketStore>, Error>;

    /// Build the store and register it under its bucket name.
    fn register(transport: &mut ObjectStoreTransport, creds: &Self::Credentials) -> Result<(), Error> {
        let store = Self::build(creds)?;
        let bucket = Self::bucket(creds);
        tracing::info!(
            target: TRACING_TARGET_TRANSPORT,
            provider = Self::ID,
            bucket,
            "registered bucket store"
        );
        transport.insert_bucket(bucket, store);
        Ok(())
    }
}

/// Wraps a backend builder failure.
#[cfg(any(feature = "aws", feature = "azure", feature = "gcp"))]
pub(crate) fn build_error(provider: &'static str, err: object_store::Error) -> Error {
    Error::Provider {
        provider,
        source: err.into(),
    }
}
