//! Ranged download pipeline.
//!
//! A download probes the object size, plans fixed-size ranges over it, and
//! hands the plan to a background task that fetches one range at a time.
//! The caller consumes the result as an [`ObjectReader`].

mod planner;
mod reader;

use std::num::NonZeroU64;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use self::planner::RangePlan;
pub use self::reader::ObjectReader;
use crate::TRACING_TARGET_DOWNLOAD;
use crate::cancel::until_cancelled;
use crate::transport::Transport;
use crate::types::{Error, ObjectLocator, Result};

/// Returns the object's size in bytes.
pub(crate) async fn probe_size(
    transport: &dyn Transport,
    cancel: &CancellationToken,
    locator: &ObjectLocator,
) -> Result<u64> {
    until_cancelled(cancel, "download", transport.head_object(locator))
        .await?
        .map_err(|source| Error::Metadata {
            locator: locator.clone(),
            source,
        })
}

/// Probes `locator` and starts streaming it in `part_size` ranges.
pub(crate) async fn start(
    transport: Arc<dyn Transport>,
    cancel: &CancellationToken,
    locator: &ObjectLocator,
    part_size: NonZeroU64,
) -> Result<ObjectReader> {
    let length = probe_size(transport.as_ref(), cancel, locator).await?;
    let plan = RangePlan::new(length, part_size);

    tracing::debug!(
        target: TRACING_TARGET_DOWNLOAD,
        length,
        part_size = part_size.get(),
        ranges = plan.range_count(),
        "planned ranged download"
    );

    Ok(ObjectReader::spawn(transport, locator.clone(), plan, cancel))
}
