// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Severity mapping following the OpenTelemetry log data model.
//!
//! <https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/logs/data-model.md#displaying-severity>

use tracing::Level;

use crate::error::EnrichError;

/// The fixed level-name to `severityNumber` table.
///
/// `WARN`/`WARNING` and `FATAL`/`CRITICAL` are aliases, so records can come
/// from either the tracing engine or hand-built raw records without
/// renaming.
const SEVERITY_NUMBER_MAPPING: &[(&str, u8)] = &[
    ("TRACE", 1),
    ("DEBUG", 5),
    ("INFO", 9),
    ("WARNING", 13),
    ("WARN", 13),
    ("ERROR", 17),
    ("FATAL", 21),
    ("CRITICAL", 21),
];

/// Look up the `severityNumber` for a level name.
///
/// Matching is case-insensitive. An unmapped name is a caller bug and fails
/// loudly; there is deliberately no default.
pub fn severity_number(level: &str) -> Result<u8, EnrichError> {
    let upper = level.to_ascii_uppercase();
    SEVERITY_NUMBER_MAPPING
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, number)| *number)
        .ok_or_else(|| EnrichError::UnmappedSeverity(upper))
}

/// The `severityText` for one of the engine's levels.
pub fn severity_text(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "ERROR",
    }
}
