#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for client-level operations.
///
/// Use this target for logging call entry, configuration, and call outcomes.
pub const TRACING_TARGET_CLIENT: &str = "nvisy_object::client";

/// Tracing target for ranged downloads.
///
/// Use this target for logging range planning, range fetches, and stream termination.
pub const TRACING_TARGET_DOWNLOAD: &str = "nvisy_object::download";

/// Tracing target for multipart uploads.
///
/// Use this target for logging part buffering, part uploads, retries, and finalization.
pub const TRACING_TARGET_UPLOAD: &str = "nvisy_object::upload";

/// Tracing target for transport calls.
pub const TRACING_TARGET_TRANSPORT: &str = "nvisy_object::transport";

/// Get/Put facade over a transport.
pub mod client;
/// Transfer configuration and validation.
pub mod config;
/// Ranged download: range planning and the streaming reader.
pub mod download;
/// Object storage provider factories.
pub mod providers;
/// Bounded retry with exponential backoff.
pub mod retry;
/// Storage capability consumed by the transfer engine.
pub mod transport;
/// Shared types (locators, ranges, sessions, errors).
pub mod types;
/// Multipart upload: part buffering, part upload, finalization.
pub mod upload;

mod cancel;

#[doc(hidden)]
pub mod prelude;

pub use types::{Error, PutError, Result};
