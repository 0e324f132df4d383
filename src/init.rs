// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Pipeline configuration and installation.

use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::enrich::Enricher;
use crate::error::ConfigError;
use crate::layer::OtelJsonLayer;
use crate::resource::Resource;
use crate::sink::ErrorSink;

/// Configuration for the logging pipeline.
///
/// Everything is optional. Service identity fields not set here fall back to
/// the `DEPLOYMENT_NAME` / `DEPLOYMENT_VERSION` / `DEPLOYMENT_ENV` environment
/// variables, then to built-in defaults (see [`Resource`]).
#[derive(Clone)]
pub struct LoggingConfig {
    /// Minimum severity if no filter directive applies.
    pub level: Level,

    /// Explicit `service.name`.
    pub service_name: Option<String>,

    /// Explicit `service.version`.
    pub service_version: Option<String>,

    /// Explicit `deployment.environment`.
    pub deployment_env: Option<String>,

    /// Pretty-print output records instead of one JSON object per line.
    pub pretty_print: bool,

    /// Error-tracking sink for exception-carrying records. None disables
    /// dispatch entirely.
    pub error_sink: Option<Arc<dyn ErrorSink>>,

    /// Custom filter directive. Takes precedence over `RUST_LOG`; with
    /// neither set, `level` applies.
    pub filter_directive: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            service_name: None,
            service_version: None,
            deployment_env: None,
            pretty_print: false,
            error_sink: None,
            filter_directive: None,
        }
    }
}

impl std::fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("level", &self.level)
            .field("service_name", &self.service_name)
            .field("service_version", &self.service_version)
            .field("deployment_env", &self.deployment_env)
            .field("pretty_print", &self.pretty_print)
            .field("error_sink", &self.error_sink.as_ref().map(|_| "dyn ErrorSink"))
            .field("filter_directive", &self.filter_directive)
            .finish()
    }
}

impl LoggingConfig {
    /// Set the minimum severity.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the service name explicitly.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the service version explicitly.
    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Set the deployment environment explicitly.
    pub fn with_deployment_env(mut self, env: impl Into<String>) -> Self {
        self.deployment_env = Some(env.into());
        self
    }

    /// Enable or disable pretty-printed output.
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Install an error-tracking sink.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    /// Build the enricher this configuration describes.
    ///
    /// Used by [`init_logging`]; also the hook for embedding the layer in an
    /// existing registry via [`OtelJsonLayer::new`].
    pub fn enricher(&self) -> Enricher {
        let resource = Resource::resolve(
            self.service_name.clone(),
            self.service_version.clone(),
            self.deployment_env.clone(),
        );
        Enricher::new(resource, self.error_sink.clone())
    }
}

/// Guard that flushes the pipeline on drop.
///
/// Keep this guard alive for the duration of your program.
pub struct LoggingGuard {
    _private: (),
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        // Output goes through unbuffered stdout; reserved for future use.
    }
}

/// Install the process-wide logging pipeline.
///
/// This should be called once at application startup. A malformed filter
/// directive or an already-installed subscriber fails loudly; once
/// installation succeeds, the pipeline only degrades best-effort.
///
/// # Example
///
/// ```rust,ignore
/// use otelog::{init_logging, LoggingConfig};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let _guard = init_logging(
///         &LoggingConfig::default()
///             .with_service_name("checkout")
///             .with_deployment_env("staging"),
///     )?;
///
///     tracing::info!("pipeline up");
///     Ok(())
/// }
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, ConfigError> {
    let filter = build_filter(config)?;
    let layer = OtelJsonLayer::new(
        config.enricher(),
        std::io::stdout as fn() -> std::io::Stdout,
        config.pretty_print,
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| ConfigError::InitFailed(err.to_string()))?;

    Ok(LoggingGuard { _private: () })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match &config.filter_directive {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()))),
    }
}
