// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The tracing layer that turns events into enriched JSON lines.
//!
//! [`OtelJsonLayer`] sits in a `tracing_subscriber` registry, collects each
//! event's fields, runs the [`Enricher`], and writes one JSON object per line
//! (or pretty-printed, if configured) through a [`MakeWriter`].
//!
//! # Emission conventions
//!
//! - The event message becomes the record message.
//! - A field holding an error value (`exception = &err as &(dyn Error)`), or a
//!   string/debug field named `exception`, becomes the exception attachment.
//!   For error values the attachment is the `Display` text followed by the
//!   `source()` chain.
//! - Every other field forms the structured-fields payload that ends up in
//!   `body`.
//!
//! Failures past the configuration boundary (stream writes, and the
//! enrichment path, which cannot fail for the engine's own level set) degrade
//! to a best-effort diagnostic on stderr. Emitting a log line never panics or
//! propagates an error into the application.

use std::io::Write;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::context::ContextFrame;
use crate::enrich::Enricher;
use crate::record::RawRecord;
use crate::severity::severity_text;

const MESSAGE_KEY: &str = "message";
const EXCEPTION_KEY: &str = "exception";

/// Layer serializing enriched records to a writer.
#[derive(Debug)]
pub struct OtelJsonLayer<W> {
    enricher: Enricher,
    make_writer: W,
    pretty: bool,
}

impl<W> OtelJsonLayer<W>
where
    W: for<'w> MakeWriter<'w>,
{
    pub fn new(enricher: Enricher, make_writer: W, pretty: bool) -> Self {
        Self {
            enricher,
            make_writer,
            pretty,
        }
    }
}

impl<S, W> Layer<S> for OtelJsonLayer<W>
where
    S: Subscriber,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let mut raw = RawRecord::new(severity_text(metadata.level()), visitor.message)
            .with_logger(metadata.target().to_string());
        if !visitor.fields.is_empty() {
            raw.fields = Some(visitor.fields);
        }
        raw.exception = visitor.exception;

        let record = match self.enricher.enrich(raw) {
            Ok(record) => record,
            // Unreachable for the engine's level set; surfaced on the
            // fallback channel because a Layer has no error path.
            Err(err) => {
                eprintln!("otelog: failed to enrich record: {}", err);
                return;
            }
        };

        let serialized = if self.pretty {
            serde_json::to_string_pretty(&record)
        } else {
            serde_json::to_string(&record)
        };
        let line = match serialized {
            Ok(line) => line,
            Err(err) => {
                eprintln!("otelog: failed to serialize record: {}", err);
                return;
            }
        };

        let mut writer = self.make_writer.make_writer();
        if let Err(err) = writeln!(writer, "{}", line) {
            eprintln!("otelog: failed to write record: {}", err);
        }
    }
}

/// Collects an event's fields into message, exception, and payload parts.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    exception: Option<String>,
    fields: ContextFrame,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            MESSAGE_KEY => self.message = value.to_string(),
            EXCEPTION_KEY => self.exception = Some(value.to_string()),
            name => {
                self.fields
                    .insert(name.to_string(), serde_json::Value::String(value.to_string()));
            }
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.exception = Some(format_error_chain(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            MESSAGE_KEY => self.message = format!("{:?}", value),
            EXCEPTION_KEY => self.exception = Some(format!("{:?}", value)),
            name => {
                self.fields
                    .insert(name.to_string(), serde_json::Value::String(format!("{:?}", value)));
            }
        }
    }
}

/// Render an error and its `source()` chain as the stack-trace text.
fn format_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str("\ncaused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
