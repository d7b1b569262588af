//! Transfer configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::types::{Error, Result};

/// Largest part (and range) the backing stores accept: 5 GiB.
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Largest number of parts in one multipart upload.
pub const MAX_PARTS: u32 = 10_000;

// Default values
const DEFAULT_READ_PART_SIZE: u64 = 16 * 1024 * 1024;
const DEFAULT_WRITE_PART_SIZE: u64 = 8 * 1024 * 1024;
const DEFAULT_READ_INCREMENT: u64 = 1024 * 1024;
const DEFAULT_MAX_UPLOAD_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_INITIAL_BACKOFF_MS: u64 = 50;
const DEFAULT_RETRY_MAX_BACKOFF_MS: u64 = 1_000;
const DEFAULT_ABORT_TIMEOUT_SECS: u64 = 30;

/// Part sizes, retry policy, and limits for chunked transfers.
///
/// Every field has a default; [`validate`](Self::validate) runs when a
/// [`TransferClient`](crate::client::TransferClient) is built, so invalid
/// values fail before any transfer starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(default, rename_all = "camelCase")]
pub struct TransferConfig {
    /// Size in bytes of each ranged read during downloads.
    #[cfg_attr(
        feature = "config",
        arg(long = "read-part-size", env = "NVISY_READ_PART_SIZE", default_value_t = DEFAULT_READ_PART_SIZE)
    )]
    pub read_part_size: u64,

    /// Size in bytes of each uploaded part (the last part may be shorter).
    #[cfg_attr(
        feature = "config",
        arg(long = "write-part-size", env = "NVISY_WRITE_PART_SIZE", default_value_t = DEFAULT_WRITE_PART_SIZE)
    )]
    pub write_part_size: u64,

    /// Size in bytes of each read from the upload source.
    #[cfg_attr(
        feature = "config",
        arg(long = "read-increment", env = "NVISY_READ_INCREMENT", default_value_t = DEFAULT_READ_INCREMENT)
    )]
    pub read_increment: u64,

    /// Attempts per part upload, including the first one.
    #[cfg_attr(
        feature = "config",
        arg(long = "max-upload-attempts", env = "NVISY_MAX_UPLOAD_ATTEMPTS", default_value_t = DEFAULT_MAX_UPLOAD_ATTEMPTS)
    )]
    pub max_upload_attempts: u32,

    /// Maximum number of parts per upload.
    #[cfg_attr(
        feature = "config",
        arg(long = "max-parts", env = "NVISY_MAX_PARTS", default_value_t = MAX_PARTS)
    )]
    pub max_parts: u32,

    /// Delay before the first part upload retry, in milliseconds (0 retries immediately).
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-initial-backoff-ms", env = "NVISY_RETRY_INITIAL_BACKOFF_MS", default_value_t = DEFAULT_RETRY_INITIAL_BACKOFF_MS)
    )]
    pub retry_initial_backoff_ms: u64,

    /// Upper bound for a single retry delay, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-max-backoff-ms", env = "NVISY_RETRY_MAX_BACKOFF_MS", default_value_t = DEFAULT_RETRY_MAX_BACKOFF_MS)
    )]
    pub retry_max_backoff_ms: u64,

    /// Time allowed for an abort call, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "abort-timeout", env = "NVISY_ABORT_TIMEOUT_SECS", default_value_t = DEFAULT_ABORT_TIMEOUT_SECS)
    )]
    pub abort_timeout_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            read_part_size: DEFAULT_READ_PART_SIZE,
            write_part_size: DEFAULT_WRITE_PART_SIZE,
            read_increment: DEFAULT_READ_INCREMENT,
            max_upload_attempts: DEFAULT_MAX_UPLOAD_ATTEMPTS,
            max_parts: MAX_PARTS,
            retry_initial_backoff_ms: DEFAULT_RETRY_INITIAL_BACKOFF_MS,
            retry_max_backoff_ms: DEFAULT_RETRY_MAX_BACKOFF_MS,
            abort_timeout_secs: DEFAULT_ABORT_TIMEOUT_SECS,
        }
    }
}

impl TransferConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ranged-read size.
    ///
    /// Fails immediately when `size` is zero or above [`MAX_PART_SIZE`].
    pub fn with_read_part_size(mut self, size: u64) -> Result<Self> {
        check_part_size("read part size", size)?;
        self.read_part_size = size;
        Ok(self)
    }

    /// Set the upload part size.
    #[must_use]
    pub fn with_write_part_size(mut self, size: u64) -> Self {
        self.write_part_size = size;
        self
    }

    /// Set the size of each read from the upload source.
    #[must_use]
    pub fn with_read_increment(mut self, size: u64) -> Self {
        self.read_increment = size;
        self
    }

    /// Set the number of attempts per part upload.
    #[must_use]
    pub fn with_max_upload_attempts(mut self, attempts: u32) -> Self {
        self.max_upload_attempts = attempts;
        self
    }

    /// Set the part-count ceiling.
    #[must_use]
    pub fn with_max_parts(mut self, max_parts: u32) -> Self {
        self.max_parts = max_parts;
        self
    }

    /// Set the retry backoff bounds in milliseconds.
    #[must_use]
    pub fn with_retry_backoff_ms(mut self, initial: u64, max: u64) -> Self {
        self.retry_initial_backoff_ms = initial;
        self.retry_max_backoff_ms = max;
        self
    }

    /// Set the abort timeout in seconds.
    #[must_use]
    pub fn with_abort_timeout_secs(mut self, secs: u64) -> Self {
        self.abort_timeout_secs = secs;
        self
    }

    /// Returns the retry policy for part uploads.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_upload_attempts,
            Duration::from_millis(self.retry_initial_backoff_ms),
        )
        .with_max_backoff(Duration::from_millis(self.retry_max_backoff_ms))
    }

    /// Returns the abort timeout as a Duration.
    #[inline]
    pub fn abort_timeout(&self) -> Duration {
        Duration::from_secs(self.abort_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        check_part_size("read part size", self.read_part_size)?;
        check_part_size("write part size", self.write_part_size)?;
        check_part_size("read increment", self.read_increment)?;

        if usize::try_from(self.write_part_size).is_err() {
            return Err(Error::invalid_config(format!(
                "write part size {} does not fit in memory on this platform",
                self.write_part_size
            )));
        }

        if self.max_upload_attempts == 0 {
            return Err(Error::invalid_config(
                "max upload attempts must be at least 1",
            ));
        }

        if self.max_parts == 0 || self.max_parts > MAX_PARTS {
            return Err(Error::invalid_config(format!(
                "max parts {} is outside 1..={MAX_PARTS}",
                self.max_parts
            )));
        }

        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(Error::invalid_config(format!(
                "initial retry backoff {}ms exceeds the maximum {}ms",
                self.retry_initial_backoff_ms, self.retry_max_backoff_ms
            )));
        }

        if self.abort_timeout_secs == 0 {
            return Err(Error::invalid_config("abort timeout must be at least 1 second"));
        }

        Ok(())
    }
}

fn check_part_size(name: &str, size: u64) -> Result<()> {
    if size == 0 {
        return Err(Error::invalid_config(format!("{name} must be positive")));
    }
    if size > MAX_PART_SIZE {
        return Err(Error::invalid_config(format!(
            "{name} {size} exceeds the {MAX_PART_SIZE} byte limit"
        )));
    }
    Ok(())
}
