//! `nvisy get`: streams an object to a file or stdout.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use nvisy_object::client::TransferClient;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_TRANSFER;

/// Arguments for `nvisy get`.
#[derive(Debug, Clone, Args)]
pub struct GetArgs {
    /// Object key.
    pub key: String,

    /// Prefix prepended verbatim to the key.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Destination file; stdout when omitted or `-`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub(super) async fn run(
    client: &TransferClient,
    cancel: &CancellationToken,
    bucket: &str,
    args: &GetArgs,
) -> anyhow::Result<()> {
    let locator = super::locator(bucket, args.prefix.as_deref(), &args.key);
    let reader = client
        .get(cancel, &locator)
        .await
        .with_context(|| format!("could not open '{locator}'"))?;
    let size = reader.size();
    let source = reader.into_async_read();

    let copied = match args.output.as_deref().filter(|path| path.as_os_str() != "-") {
        Some(path) => copy_to_file(source, path)
            .await
            .with_context(|| format!("download of '{locator}' failed"))?,
        None => copy(source, tokio::io::stdout())
            .await
            .with_context(|| format!("download of '{locator}' failed"))?,
    };

    tracing::info!(
        target: TRACING_TARGET_TRANSFER,
        object = %locator,
        bytes = copied,
        size,
        "download complete"
    );
    Ok(())
}

/// Downloads into a temporary file beside `path` and moves it into place
/// only once every byte has arrived. A failed download leaves `path` as it was.
async fn copy_to_file<R>(source: R, path: &Path) -> anyhow::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("could not create a temporary file in '{}'", dir.display()))?;
    let file = File::from_std(staging.reopen()?);

    let copied = copy(source, file).await?;
    staging
        .persist(path)
        .with_context(|| format!("could not write '{}'", path.display()))?;
    Ok(copied)
}

async fn copy<R, W>(mut source: R, mut sink: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = tokio::io::copy(&mut source, &mut sink).await?;
    sink.flush().await?;
    Ok(copied)
}
