//! Subcommands.

mod get;
mod put;

use clap::Subcommand;
pub use get::GetArgs;
use nvisy_object::client::TransferClient;
use nvisy_object::types::ObjectLocator;
pub use put::PutArgs;
use tokio_util::sync::CancellationToken;

/// Transfer to run.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Download an object to a file or stdout.
    Get(GetArgs),
    /// Upload a file or stdin as an object.
    Put(PutArgs),
}

impl Command {
    /// Runs the subcommand against `bucket`.
    pub async fn run(
        &self,
        client: &TransferClient,
        cancel: &CancellationToken,
        bucket: &str,
    ) -> anyhow::Result<()> {
        match self {
            Self::Get(args) => get::run(client, cancel, bucket, args).await,
            Self::Put(args) => put::run(client, cancel, bucket, args).await,
        }
    }
}

/// Builds the locator for `key` under an optional `prefix`.
fn locator(bucket: &str, prefix: Option<&str>, key: &str) -> ObjectLocator {
    let locator = ObjectLocator::new(bucket, key);
    match prefix {
        Some(prefix) => locator.with_prefix(prefix),
        None => locator,
    }
}
