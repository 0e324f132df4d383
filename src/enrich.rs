// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The record enricher: raw record in, OpenTelemetry-shaped record out.
//!
//! A single-pass transform, pure with respect to its inputs except for two
//! side effects: it reads the calling branch's context frame, and it forwards
//! exception-carrying records to the configured [`ErrorSink`]. Enrichment
//! failures (an unmapped severity) are loud, since they indicate a caller bug;
//! sink failures are swallowed.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context;
use crate::error::EnrichError;
use crate::record::{format_timestamp, EnrichedRecord, RawRecord};
use crate::resource::Resource;
use crate::severity::severity_number;
use crate::sink::ErrorSink;

/// Transforms raw records into the output schema.
///
/// One enricher lives in the installed pipeline, holding the resolved service
/// identity and the optional error-tracking sink.
#[derive(Clone)]
pub struct Enricher {
    resource: Resource,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("resource", &self.resource)
            .field("sink", &self.sink.as_ref().map(|_| "dyn ErrorSink"))
            .finish()
    }
}

impl Enricher {
    pub fn new(resource: Resource, sink: Option<Arc<dyn ErrorSink>>) -> Self {
        Self { resource, sink }
    }

    /// Enrich one raw record.
    ///
    /// Fails only on an unmapped severity level; everything downstream of a
    /// mappable level completes.
    pub fn enrich(&self, raw: RawRecord) -> Result<EnrichedRecord, EnrichError> {
        let severity_text = raw.level.to_ascii_uppercase();
        let severity_number = severity_number(&severity_text)?;
        let timestamp = format_timestamp(raw.timestamp);

        let mut attributes = Map::new();
        attributes.insert("code.function".to_string(), Value::String(raw.logger));
        for (key, value) in context::current_frame() {
            attributes.insert(format!("context.{}", key), value);
        }

        let resource = self.resource.to_map();

        // On exception records the message becomes error.message; it is then
        // consumed and no longer available for the body.
        let mut message = Some(raw.message);
        if let Some(stack_trace) = raw.exception {
            let error_message = message.take().unwrap_or_default();
            attributes.insert(
                "error.message".to_string(),
                Value::String(error_message.clone()),
            );
            attributes.insert(
                "error.stack_trace".to_string(),
                Value::String(stack_trace.clone()),
            );

            if let Some(sink) = &self.sink {
                let mut report_context = Map::new();
                report_context.insert("timestamp".to_string(), Value::String(timestamp.clone()));
                report_context.insert(
                    "severityText".to_string(),
                    Value::String(severity_text.clone()),
                );
                report_context.insert(
                    "severityNumber".to_string(),
                    Value::Number(severity_number.into()),
                );
                report_context.insert(
                    "attributes".to_string(),
                    Value::Object(attributes.clone()),
                );
                report_context.insert("resource".to_string(), Value::Object(resource.clone()));
                if let Err(err) = sink.report(&error_message, &stack_trace, &report_context) {
                    // Fire-and-forget: a broken sink must not crash the caller.
                    eprintln!("otelog: error sink dispatch failed: {:#}", err);
                }
            }
        }

        let body = match (raw.fields, message) {
            (Some(mut fields), message) => {
                if let Some(message) = message {
                    fields.insert("message".to_string(), Value::String(message));
                }
                Some(Value::Object(fields))
            }
            (None, Some(message)) => Some(Value::String(message)),
            (None, None) => None,
        };

        Ok(EnrichedRecord {
            timestamp,
            severity_text,
            severity_number,
            attributes,
            resource,
            body,
        })
    }
}
