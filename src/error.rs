// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the logging pipeline.
//!
//! Two error classes exist, matching how they must be handled:
//!
//! - [`ConfigError`] and [`EnrichError`] indicate integration bugs (a bad filter
//!   directive, an unmapped severity level). They are raised loudly at the call
//!   site so the misconfiguration gets fixed.
//! - Sink dispatch and stream writes degrade silently instead; logging must
//!   never be the reason an application crashes. Those paths carry no error
//!   type at all past the pipeline boundary.

use thiserror::Error;

/// Errors that can occur while configuring the logging pipeline.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),

    #[error("Failed to install global subscriber: {0}")]
    InitFailed(String),
}

impl From<tracing_subscriber::filter::ParseError> for ConfigError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        Self::InvalidFilter(err.to_string())
    }
}

/// Errors that can occur while enriching a raw log record.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Unmapped severity level: {0}")]
    UnmappedSeverity(String),
}

/// Result type alias using anyhow for flexible error handling.
///
/// Used at the [`ErrorSink`](crate::sink::ErrorSink) boundary, where the
/// concrete failure mode belongs to the injected implementation.
pub type Result<T> = anyhow::Result<T>;
