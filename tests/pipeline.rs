// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end pipeline tests: events emitted through `tracing` come out the
//! writer as enriched JSON records.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use otelog::{context, ErrorSink, LoggingConfig, OtelJsonLayer};

/// Serializes tests that touch the process environment.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// A test writer that captures output for verification.
#[derive(Clone, Debug)]
struct TestWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl TestWriter {
    fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn get_output(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).to_string()
    }

    fn records(&self) -> Vec<Value> {
        self.get_output()
            .trim()
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for TestWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture(config: &LoggingConfig, f: impl FnOnce()) -> Vec<Value> {
    let writer = TestWriter::new();
    let layer = OtelJsonLayer::new(config.enricher(), writer.clone(), config.pretty_print);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    writer.records()
}

#[test]
fn plain_info_event_becomes_an_enriched_record() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let records = capture(&config, || {
        tracing::info!("Info");
    });

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["severityText"], "INFO");
    assert_eq!(record["severityNumber"], 9);
    assert_eq!(record["body"], "Info");
    assert_eq!(record["resource"]["service.name"], "svc");
    assert_eq!(record["resource"]["telemetry.sdk.language"], "rust");
    assert!(record["attributes"]["code.function"].is_string());
    assert!(record["timestamp"].is_string());
}

#[test]
fn structured_fields_merge_into_the_body() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let records = capture(&config, || {
        tracing::info!(rows = 3, table = "users", "query done");
    });

    let body = &records[0]["body"];
    assert_eq!(body["rows"], 3);
    assert_eq!(body["table"], "users");
    assert_eq!(body["message"], "query done");
}

#[test]
fn context_fields_appear_as_prefixed_attributes() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let records = capture(&config, || {
        let _scope = context::scope(otelog::context! { "request_id" => "abc" });
        tracing::info!("handled");
    });

    let attributes = &records[0]["attributes"];
    assert_eq!(attributes["context.request_id"], "abc");
}

#[test]
fn declared_keys_keep_extraneous_fields_out_of_the_record() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let call_fields = otelog::context! { "key" => "v", "other" => "x" };
    let records = capture(&config, || {
        let _scope = context::scope_with_keys(&["key"], &call_fields);
        tracing::info!("handled");
    });

    let attributes = records[0]["attributes"].as_object().unwrap();
    assert_eq!(attributes["context.key"], "v");
    assert!(!attributes.contains_key("context.other"));
}

#[test]
fn severity_mapping_matches_the_model_end_to_end() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let records = capture(&config, || {
        tracing::warn!("w");
        tracing::error!("e");
    });

    assert_eq!(records[0]["severityText"], "WARN");
    assert_eq!(records[0]["severityNumber"], 13);
    assert_eq!(records[1]["severityText"], "ERROR");
    assert_eq!(records[1]["severityNumber"], 17);
}

#[test]
fn minimum_severity_filters_lower_levels() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let writer = TestWriter::new();
    let layer = OtelJsonLayer::new(config.enricher(), writer.clone(), false);
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("info"))
        .with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("hidden");
        tracing::info!("visible");
    });

    let records = writer.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["body"], "visible");
}

#[derive(Debug)]
struct DnsError;

impl std::fmt::Display for DnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lookup failed")
    }
}

impl std::error::Error for DnsError {}

#[derive(Debug)]
struct RequestError(DnsError);

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request failed")
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn exception_events_populate_error_attributes_and_drop_raw_fields() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let err = RequestError(DnsError);
    let records = capture(&config, || {
        tracing::error!(
            exception = &err as &(dyn std::error::Error + 'static),
            "upstream call failed"
        );
    });

    let record = &records[0];
    let attributes = record["attributes"].as_object().unwrap();
    assert_eq!(attributes["error.message"], "upstream call failed");
    assert_eq!(
        attributes["error.stack_trace"],
        "request failed\ncaused by: lookup failed"
    );
    // The raw exception field must not survive anywhere in the output.
    assert!(!attributes.contains_key("exception"));
    assert!(record.get("body").is_none());
    assert_eq!(record["severityNumber"], 17);
}

#[test]
fn exception_can_also_be_attached_as_display_text() {
    context::clear_context();
    let config = LoggingConfig::default().with_service_name("svc");
    let records = capture(&config, || {
        tracing::error!(exception = %DnsError, "resolve failed");
    });

    let attributes = &records[0]["attributes"];
    assert_eq!(attributes["error.message"], "resolve failed");
    assert_eq!(attributes["error.stack_trace"], "lookup failed");
}

#[derive(Default)]
struct CapturingSink {
    reports: Mutex<Vec<(String, String, Map<String, Value>)>>,
}

impl ErrorSink for CapturingSink {
    fn report(
        &self,
        message: &str,
        stack_trace: &str,
        report_context: &Map<String, Value>,
    ) -> otelog::Result<()> {
        self.reports.lock().unwrap().push((
            message.to_string(),
            stack_trace.to_string(),
            report_context.clone(),
        ));
        Ok(())
    }
}

#[test]
fn configured_sink_receives_exception_reports_only() {
    context::clear_context();
    let sink = Arc::new(CapturingSink::default());
    let config = LoggingConfig::default()
        .with_service_name("svc")
        .with_error_sink(sink.clone());

    capture(&config, || {
        tracing::info!("fine");
        tracing::error!(exception = %DnsError, "resolve failed");
    });

    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let (message, stack_trace, report_context) = &reports[0];
    assert_eq!(message, "resolve failed");
    assert_eq!(stack_trace, "lookup failed");
    assert_eq!(report_context["attributes"]["error.message"], "resolve failed");
    assert_eq!(report_context["resource"]["service.name"], "svc");
}

#[test]
fn pretty_print_emits_indented_json() {
    context::clear_context();
    let config = LoggingConfig::default()
        .with_service_name("svc")
        .with_pretty_print(true);
    let writer = TestWriter::new();
    let layer = OtelJsonLayer::new(config.enricher(), writer.clone(), config.pretty_print);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("pretty");
    });

    let output = writer.get_output();
    assert!(output.lines().count() > 1);
    let record: Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(record["body"], "pretty");
}

#[test]
fn service_identity_falls_back_to_deployment_env_vars() {
    let _lock = ENV_LOCK.lock().unwrap();
    context::clear_context();
    std::env::set_var("DEPLOYMENT_NAME", "Svc");
    std::env::set_var("DEPLOYMENT_VERSION", "2.0.1");
    std::env::set_var("DEPLOYMENT_ENV", "staging");
    std::env::set_var("HOSTNAME", "pod-1");

    let config = LoggingConfig::default();
    let records = capture(&config, || {
        tracing::info!("Info");
    });

    std::env::remove_var("DEPLOYMENT_NAME");
    std::env::remove_var("DEPLOYMENT_VERSION");
    std::env::remove_var("DEPLOYMENT_ENV");
    std::env::remove_var("HOSTNAME");

    let resource = &records[0]["resource"];
    assert_eq!(resource["service.name"], "Svc");
    assert_eq!(resource["service.version"], "2.0.1");
    assert_eq!(resource["deployment.environment"], "staging");
    assert_eq!(resource["host.name"], "pod-1");
    assert_eq!(records[0]["severityNumber"], 9);
    assert_eq!(records[0]["body"], "Info");
}

#[test]
fn unset_identity_fields_are_omitted_and_name_falls_back_to_process() {
    let _lock = ENV_LOCK.lock().unwrap();
    context::clear_context();
    std::env::remove_var("DEPLOYMENT_NAME");
    std::env::remove_var("DEPLOYMENT_VERSION");
    std::env::remove_var("DEPLOYMENT_ENV");

    let config = LoggingConfig::default();
    let records = capture(&config, || {
        tracing::info!("Info");
    });

    let resource = records[0]["resource"].as_object().unwrap();
    assert!(resource["service.name"]
        .as_str()
        .unwrap()
        .starts_with("unknown_service:"));
    assert!(!resource.contains_key("service.version"));
    assert!(!resource.contains_key("deployment.environment"));
}
