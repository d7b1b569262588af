//! Azure Blob Storage provider using [`object_store::azure::MicrosoftAzureBuilder`].

use std::sync::Arc;

use object_store::azure::MicrosoftAzureBuilder;
use serde::{Deserialize, Serialize};

use super::Provider;
use super::provider::build_error;
use crate::transport::BucketStore;
use crate::types::Error;

/// Typed credentials for Azure Blob Storage.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    /// Azure storage container name; used as the bucket name.
    pub container: String,
    /// Azure storage account name.
    pub account_name: String,
    /// Storage account access key.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Shared Access Signature token.
    #[serde(default)]
    pub sas_token: Option<String>,
    /// Custom endpoint URL (for Azure Stack or Azurite).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("container", &self.container)
            .field("account_name", &self.account_name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Splits a SAS token (`?sv=...&sig=...`) into query pairs.
fn sas_pairs(sas: &str) -> Vec<(String, String)> {
    sas.trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            Some((
                parts.next()?.to_string(),
                parts.next().unwrap_or("").to_string(),
            ))
        })
        .collect()
}

/// Azure Blob Storage-backed bucket stores.
pub struct AzureProvider;

impl Provider for AzureProvider {
    type Credentials = AzureCredentials;

    const ID: &'static str = "azure";

    fn bucket(creds: &Self::Credentials) -> &str {
        &creds.container
    }

    fn build(creds: &Self::Credentials) -> Result<Arc<dyn BucketStore>, Error> {
        let mut builder = MicrosoftAzureBuilder::new()
            .with_container_name(&creds.container)
            .with_account(&creds.account_name);

        if let Some(key) = &creds.access_key {
            builder = builder.with_access_key(key);
        }

        if let Some(sas) = &creds.sas_token {
            builder = builder.with_sas_authorization(sas_pairs(sas));
        }

        if let Some(endpoint) = &creds.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
        }

        let store = builder.build().map_err(|e| build_error(Self::ID, e))?;
        Ok(Arc::new(store))
    }
}
