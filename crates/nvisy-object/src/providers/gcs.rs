//! Google Cloud Storage provider using [`object_store::gcp::GoogleCloudStorageBuilder`].

use std::sync::Arc;

use object_store::gcp::GoogleCloudStorageBuilder;
use serde::{Deserialize, Serialize};

use super::Provider;
use super::provider::build_error;
use crate::transport::BucketStore;
use crate::types::Error;

/// Typed credentials for Google Cloud Storage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsCredentials {
    /// GCS bucket name.
    pub bucket: String,
    /// Path to a JSON service account key file.
    #[serde(default)]
    pub service_account_path: Option<String>,
    /// Custom endpoint URL (for testing with a fake GCS server).
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Google Cloud Storage-backed bucket stores.
pub struct GcsProvider;

impl Provider for GcsProvider {
    type Credentials = GcsCredentials;

    const ID: &'static str = "gcs";

    fn bucket(creds: &Self::Credentials) -> &str {
        &creds.bucket
    }

    fn build(creds: &Self::Credentials) -> Result<Arc<dyn BucketStore>, Error> {
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(&creds.bucket);

        if let Some(path) = &creds.service_account_path {
            builder = builder.with_service_account_path(path);
        }

        if let Some(endpoint) = &creds.endpoint {
            builder = builder.with_url(endpoint);
        }

        let store = builder.build().map_err(|e| build_error(Self::ID, e))?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_use_camel_case() {
        let creds: GcsCredentials = serde_json::from_str(
            r#"{"bucket":"media","serviceAccountPath":"/etc/gcs/key.json"}"#,
        )
        .unwrap();
        assert_eq!(GcsProvider::bucket(&creds), "media");
        assert_eq!(creds.service_account_path.as_deref(), Some("/etc/gcs/key.json"));
        assert!(creds.endpoint.is_none());
    }

    #[test]
    fn missing_service_account_file_fails_to_build() {
        let creds = GcsCredentials {
            bucket: "media".into(),
            service_account_path: Some("/nonexistent/gcs-key.json".into()),
            endpoint: None,
        };
        assert!(matches!(
            GcsProvider::build(&creds),
            Err(Error::Provider { provider: "gcs", .. })
        ));
    }
}
