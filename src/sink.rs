// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error-tracking sink capability.
//!
//! The enricher forwards exception-carrying records to an [`ErrorSink`]
//! injected at configuration time. The core never depends on a concrete
//! error-tracking service; applications plug in their client (Sentry or
//! otherwise) behind this trait, and get [`NoopSink`] if they don't.
//!
//! Dispatch is fire-and-forget: the pipeline swallows `Err` results, so a
//! broken sink degrades observability without ever crashing the observed
//! application.

use serde_json::{Map, Value};

use crate::error::Result;

/// Receives exception reports together with the enriched record fields that
/// were active when the exception was logged.
pub trait ErrorSink: Send + Sync {
    /// Report one captured exception.
    ///
    /// `message` is the log message, `stack_trace` the formatted exception
    /// text, and `context` the enriched fields of the record (severity,
    /// attributes, resource, timestamp) as contextual data.
    fn report(&self, message: &str, stack_trace: &str, context: &Map<String, Value>) -> Result<()>;
}

/// Sink that discards every report; the default when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ErrorSink for NoopSink {
    fn report(&self, _message: &str, _stack_trace: &str, _context: &Map<String, Value>) -> Result<()> {
        Ok(())
    }
}
