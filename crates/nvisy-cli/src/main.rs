#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod signal;
mod telemetry;

use std::process;

use anyhow::Context;
use nvisy_object::client::TransferClient;
use nvisy_object::providers::{Provider, S3Provider};
use nvisy_object::transport::ObjectStoreTransport;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "nvisy_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "nvisy_cli::config";
pub const TRACING_TARGET_SIGNAL: &str = "nvisy_cli::signal";
pub const TRACING_TARGET_TRANSFER: &str = "nvisy_cli::transfer";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_TRANSFER,
            error = %error,
            "transfer failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate()?;

    let mut transport = ObjectStoreTransport::new();
    S3Provider::register(&mut transport, &cli.s3).context("could not configure s3 store")?;
    let client = TransferClient::new(transport, cli.transfer.clone())
        .context("could not create transfer client")?;

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(signal::cancel_on_signal(cancel.clone()));

    let result = cli.command.run(&client, &cancel, &cli.s3.bucket).await;

    signal::stop_listener(&cancel, signals).await;

    result
}
