// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Service identity for the `resource` section of every record.
//!
//! Identity fields fall back from explicit configuration to environment
//! variables that a Kubernetes deployment populates through the downward API
//! (`DEPLOYMENT_NAME`, `DEPLOYMENT_VERSION`, `DEPLOYMENT_ENV`), and finally to
//! built-in defaults. Resolution happens once, at configuration time.

use serde_json::{Map, Value};

/// SDK identity reported under `telemetry.sdk.*` in every record.
pub const SDK_NAME: &str = env!("CARGO_PKG_NAME");
/// SDK version reported under `telemetry.sdk.version`.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
const SDK_LANGUAGE: &str = "rust";

/// Resolved identity of the logging process.
///
/// `service_name` and the SDK identity are always present; the rest is
/// omitted from output when unresolvable.
#[derive(Debug, Clone)]
pub struct Resource {
    pub service_name: String,
    pub service_version: Option<String>,
    pub deployment_env: Option<String>,
    pub host_name: Option<String>,
}

impl Resource {
    /// Resolve identity from explicit values, environment, and OS fallbacks.
    pub fn resolve(
        service_name: Option<String>,
        service_version: Option<String>,
        deployment_env: Option<String>,
    ) -> Self {
        let service_name = service_name
            .or_else(|| std::env::var("DEPLOYMENT_NAME").ok())
            .unwrap_or_else(fallback_service_name);
        let service_version = service_version.or_else(|| std::env::var("DEPLOYMENT_VERSION").ok());
        let deployment_env = deployment_env.or_else(|| std::env::var("DEPLOYMENT_ENV").ok());
        let host_name = std::env::var("HOSTNAME").ok().or_else(os_host_name);

        Self {
            service_name,
            service_version,
            deployment_env,
            host_name,
        }
    }

    /// The `resource` section as it appears in the output record.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut resource = Map::new();
        resource.insert(
            "service.name".to_string(),
            Value::String(self.service_name.clone()),
        );
        resource.insert(
            "telemetry.sdk.name".to_string(),
            Value::String(SDK_NAME.to_string()),
        );
        resource.insert(
            "telemetry.sdk.version".to_string(),
            Value::String(SDK_VERSION.to_string()),
        );
        resource.insert(
            "telemetry.sdk.language".to_string(),
            Value::String(SDK_LANGUAGE.to_string()),
        );
        if let Some(version) = &self.service_version {
            resource.insert("service.version".to_string(), Value::String(version.clone()));
        }
        if let Some(env) = &self.deployment_env {
            resource.insert(
                "deployment.environment".to_string(),
                Value::String(env.clone()),
            );
        }
        if let Some(host) = &self.host_name {
            resource.insert("host.name".to_string(), Value::String(host.clone()));
        }
        resource
    }
}

/// Identify the process when no service name was given anywhere.
fn fallback_service_name() -> String {
    let executable = std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string());
    format!("unknown_service:{}", executable)
}

fn os_host_name() -> Option<String> {
    hostname::get().ok().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let resource = Resource::resolve(
            Some("svc".to_string()),
            Some("1.2.3".to_string()),
            Some("staging".to_string()),
        );
        assert_eq!(resource.service_name, "svc");
        assert_eq!(resource.service_version.as_deref(), Some("1.2.3"));
        assert_eq!(resource.deployment_env.as_deref(), Some("staging"));
    }

    #[test]
    fn test_fallback_service_name_identifies_process() {
        assert!(fallback_service_name().starts_with("unknown_service:"));
    }

    #[test]
    fn test_to_map_always_carries_sdk_identity() {
        let resource = Resource::resolve(Some("svc".to_string()), None, None);
        let map = resource.to_map();
        assert_eq!(map["service.name"], "svc");
        assert_eq!(map["telemetry.sdk.name"], SDK_NAME);
        assert_eq!(map["telemetry.sdk.version"], SDK_VERSION);
        assert_eq!(map["telemetry.sdk.language"], "rust");
    }

    #[test]
    fn test_to_map_omits_unresolved_fields() {
        let resource = Resource {
            service_name: "svc".to_string(),
            service_version: None,
            deployment_env: None,
            host_name: None,
        };
        let map = resource.to_map();
        assert!(!map.contains_key("service.version"));
        assert!(!map.contains_key("deployment.environment"));
        assert!(!map.contains_key("host.name"));
    }
}
