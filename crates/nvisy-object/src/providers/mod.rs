//! Provider trait and object storage providers.
//!
//! Each provider is gated behind the `object_store` backend feature it needs
//! (`aws`, `azure`, `gcp`).

#[cfg(feature = "azure")]
mod azure;
#[cfg(feature = "gcp")]
mod gcs;
mod provider;
#[cfg(feature = "aws")]
mod s3;

#[cfg(feature = "azure")]
#[cfg_attr(docsrs, doc(cfg(feature = "azure")))]
pub use azure::{AzureCredentials, AzureProvider};
#[cfg(feature = "gcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "gcp")))]
pub use gcs::{GcsCredentials, GcsProvider};
pub use provider::Provider;
#[cfg(feature = "aws")]
#[cfg_attr(docsrs, doc(cfg(feature = "aws")))]
pub use s3::{S3Credentials, S3Provider};
