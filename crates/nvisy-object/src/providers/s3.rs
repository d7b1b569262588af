//! S3-compatible provider using [`object_store::aws::AmazonS3Builder`].
//!
//! Works with AWS S3, MinIO, and any S3-compatible service.

use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use super::Provider;
use super::provider::build_error;
use crate::transport::BucketStore;
use crate::types::Error;

/// Typed credentials for S3-compatible provider.
#[derive(Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct S3Credentials {
    /// S3 bucket name.
    #[cfg_attr(feature = "config", arg(long = "s3-bucket", env = "NVISY_S3_BUCKET"))]
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-region", env = "AWS_REGION", default_value = "us-east-1")
    )]
    pub region: String,
    /// Endpoint URL (e.g. `http://localhost:9000` for MinIO).
    /// Required for non-AWS S3-compatible services.
    #[serde(default)]
    #[cfg_attr(feature = "config", arg(long = "s3-endpoint", env = "NVISY_S3_ENDPOINT"))]
    pub endpoint: Option<String>,
    /// Access key ID for static credentials.
    #[serde(default)]
    #[cfg_attr(feature = "config", arg(long = "s3-access-key-id", env = "AWS_ACCESS_KEY_ID"))]
    pub access_key_id: Option<String>,
    /// Secret access key for static credentials.
    #[serde(default)]
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-secret-access-key", env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)
    )]
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials.
    #[serde(default)]
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-session-token", env = "AWS_SESSION_TOKEN", hide_env_values = true)
    )]
    pub session_token: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// S3-backed bucket stores.
pub struct S3Provider;

impl Provider for S3Provider {
    type Credentials = S3Credentials;

    const ID: &'static str = "s3";

    fn bucket(creds: &Self::Credentials) -> &str {
        &creds.bucket
    }

    fn build(creds: &Self::Credentials) -> Result<Arc<dyn BucketStore>, Error> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&creds.bucket)
            .with_region(&creds.region);

        if let Some(endpoint) = &creds.endpoint {
            builder = builder.with_endpoint(endpoint);
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        if let Some(access_key) = &creds.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &creds.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if let Some(token) = &creds.session_token {
            builder = builder.with_token(token);
        }

        let store = builder.build().map_err(|e| build_error(Self::ID, e))?;
        Ok(Arc::new(store))
    }
}
