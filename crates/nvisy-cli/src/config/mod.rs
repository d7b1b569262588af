//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── s3: S3Credentials          # Bucket, region, endpoint, static keys
//! ├── transfer: TransferConfig   # Part sizes, retries, limits
//! └── command: Command           # get | put
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! nvisy --s3-bucket media get clips/intro.mp4 --output intro.mp4
//! NVISY_S3_BUCKET=media NVISY_WRITE_PART_SIZE=16777216 nvisy put clips/intro.mp4 --input intro.mp4
//! ```

use std::process;

use anyhow::Context;
use clap::Parser;
use nvisy_object::config::TransferConfig;
use nvisy_object::providers::S3Credentials;

use crate::commands::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "nvisy")]
#[command(about = "Chunked uploads and downloads for S3-compatible object storage")]
#[command(version)]
pub struct Cli {
    /// S3 connection and credentials.
    #[clap(flatten)]
    pub s3: S3Credentials,

    /// Part sizes, retry policy, and limits.
    #[clap(flatten)]
    pub transfer: TransferConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its values
    /// can serve as defaults through clap's `env` support.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.transfer
            .validate()
            .context("invalid transfer configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            bucket = %self.s3.bucket,
            region = %self.s3.region,
            endpoint = ?self.s3.endpoint,
            static_credentials = self.s3.access_key_id.is_some(),
            "s3 configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            read_part_size = self.transfer.read_part_size,
            write_part_size = self.transfer.write_part_size,
            read_increment = self.transfer.read_increment,
            max_upload_attempts = self.transfer.max_upload_attempts,
            max_parts = self.transfer.max_parts,
            "transfer configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
