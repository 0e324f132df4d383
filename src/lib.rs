// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! otelog - structured JSON logging in the OpenTelemetry log data model.
//!
//! A small utility layer over the [`tracing`] ecosystem: it formats log
//! records into an OpenTelemetry-shaped JSON schema, attaches request/task
//! scoped contextual fields through a branch-local context store, and
//! optionally forwards exceptions to an injected error-tracking sink.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`context`] - Branch-local context store and scoped propagation API
//! - [`severity`] - The fixed OpenTelemetry severity mapping
//! - [`record`] - Raw and enriched record shapes
//! - [`resource`] - Service identity resolution (explicit, env, OS fallbacks)
//! - [`sink`] - Error-tracking sink capability, no-op by default
//! - [`enrich`] - The raw-to-enriched record transform
//! - [`layer`] - The `tracing_subscriber` layer serializing records as JSON
//! - [`init`] - Pipeline configuration and installation
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,ignore
//! use otelog::{context, init_logging, LoggingConfig};
//!
//! let _guard = init_logging(
//!     &LoggingConfig::default().with_service_name("checkout"),
//! )?;
//!
//! let _scope = otelog::context::scope(otelog::context! { "request_id" => "abc" });
//! tracing::info!(order_id = 42, "order placed");
//! // => {"timestamp":"...","severityText":"INFO","severityNumber":9,
//! //     "attributes":{"code.function":"...","context.request_id":"abc"},
//! //     "resource":{"service.name":"checkout",...},
//! //     "body":{"order_id":42,"message":"order placed"}}
//! ```

pub mod context;
pub mod enrich;
pub mod error;
pub mod init;
pub mod layer;
pub mod record;
pub mod resource;
pub mod severity;
pub mod sink;

// Re-export commonly used types at crate root
pub use context::{ContextFrame, ContextScope, WithContext};
pub use enrich::Enricher;
pub use error::{ConfigError, EnrichError, Result};
pub use init::{init_logging, LoggingConfig, LoggingGuard};
pub use layer::OtelJsonLayer;
pub use record::{EnrichedRecord, RawRecord};
pub use resource::Resource;
pub use sink::{ErrorSink, NoopSink};

/// otelog version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        // Verify key types are accessible
        let _frame = ContextFrame::new();
        let _config = LoggingConfig::default();
        let _sink = NoopSink;
    }
}
