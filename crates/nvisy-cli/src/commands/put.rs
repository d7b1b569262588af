//! `nvisy put`: uploads a file or stdin as a multipart upload.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use nvisy_object::client::TransferClient;
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_TRANSFER;

/// Arguments for `nvisy put`.
#[derive(Debug, Clone, Args)]
pub struct PutArgs {
    /// Object key.
    pub key: String,

    /// Prefix prepended verbatim to the key.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Source file; stdin when omitted or `-`.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

pub(super) async fn run(
    client: &TransferClient,
    cancel: &CancellationToken,
    bucket: &str,
    args: &PutArgs,
) -> anyhow::Result<()> {
    let locator = super::locator(bucket, args.prefix.as_deref(), &args.key);

    let source: Box<dyn AsyncRead + Send + Unpin> =
        match args.input.as_deref().filter(|path| path.as_os_str() != "-") {
            Some(path) => Box::new(
                File::open(path)
                    .await
                    .with_context(|| format!("could not open '{}'", path.display()))?,
            ),
            None => Box::new(tokio::io::stdin()),
        };

    let output = client
        .put(cancel, &locator, source)
        .await
        .with_context(|| format!("upload of '{locator}' failed"))?;

    tracing::info!(
        target: TRACING_TARGET_TRANSFER,
        object = %locator,
        bytes = output.bytes_written,
        parts = output.parts.len(),
        "upload complete"
    );
    Ok(())
}
