// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Raw and enriched log record shapes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::ContextFrame;

/// A log record as it leaves the emission call, before enrichment.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// When the record was emitted.
    pub timestamp: DateTime<Utc>,

    /// Level name, e.g. `"INFO"`. Matched case-insensitively against the
    /// severity table.
    pub level: String,

    /// Logger name (the event target for tracing events). Becomes
    /// `attributes["code.function"]`.
    pub logger: String,

    /// The message text.
    pub message: String,

    /// Optional structured-fields payload supplied at the call site.
    pub fields: Option<ContextFrame>,

    /// Pre-formatted exception text (error chain / stack trace), if the
    /// record carries one.
    pub exception: Option<String>,
}

impl RawRecord {
    /// A record with the given level and message, timestamped now.
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.into(),
            logger: String::new(),
            message: message.into(),
            fields: None,
            exception: None,
        }
    }

    /// Set the logger name.
    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = logger.into();
        self
    }

    /// Attach a structured-fields payload.
    pub fn with_fields(mut self, fields: ContextFrame) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Attach pre-formatted exception text.
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }
}

/// The OpenTelemetry-shaped output record.
///
/// Serializes to one JSON object. `body` has two shapes by convention: the
/// bare message string when the raw record carried no structured fields, or
/// the structured fields merged with a `"message"` key when it did. Exception
/// records whose message moved into `attributes["error.message"]` and that
/// carried no structured fields have no `body` at all.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecord {
    /// RFC 3339 emission time.
    pub timestamp: String,

    /// Uppercased level name.
    #[serde(rename = "severityText")]
    pub severity_text: String,

    /// Numeric severity from the fixed table.
    #[serde(rename = "severityNumber")]
    pub severity_number: u8,

    /// Event-occurrence information: `code.function`, `context.<key>` fields,
    /// and on exceptions `error.message` / `error.stack_trace`.
    pub attributes: Map<String, Value>,

    /// Source-of-the-log information: service identity, SDK identity,
    /// deployment environment, hostname.
    pub resource: Map<String, Value>,

    /// The record body; see the type docs for the two shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Format a timestamp the way the output schema expects it.
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
