//! Convenience re-exports.

pub use crate::client::{PutOutput, TransferClient};
pub use crate::config::TransferConfig;
pub use crate::download::ObjectReader;
#[cfg(feature = "azure")]
pub use crate::providers::{AzureCredentials, AzureProvider};
#[cfg(feature = "gcp")]
pub use crate::providers::{GcsCredentials, GcsProvider};
pub use crate::providers::Provider;
#[cfg(feature = "aws")]
pub use crate::providers::{S3Credentials, S3Provider};
pub use crate::transport::{ObjectStoreTransport, Transport, TransportError};
pub use crate::types::{Error, ObjectLocator, PutError};
