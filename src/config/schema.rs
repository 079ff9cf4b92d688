//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the company service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP+JSON listener.
    pub http: ListenerConfig,

    /// RPC listener.
    pub rpc: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request and frame size limits.
    pub limits: LimitsConfig,

    /// Business validation rules handed to the service at construction.
    pub validation: ValidationConfig,

    /// Shutdown behaviour of the run group.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: ListenerConfig::default(),
            rpc: ListenerConfig {
                bind_address: "0.0.0.0:8082".to_string(),
                ..ListenerConfig::default()
            },
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            validation: ValidationConfig::default(),
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Size limits for both wire protocols.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum HTTP request body in bytes.
    pub max_body_bytes: usize,

    /// Maximum RPC frame payload in bytes.
    pub max_frame_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

/// Validation rules for company entities.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Names rejected regardless of case.
    pub reserved_names: Vec<String>,

    /// Maximum name length in characters.
    pub max_name_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            reserved_names: vec!["duck".to_string()],
            max_name_len: 255,
        }
    }
}

impl ValidationConfig {
    /// Whether `name` matches a reserved name, ignoring case.
    pub fn is_reserved(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.reserved_names.iter().any(|r| r.to_lowercase() == name)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on waiting for actors after interruption, in seconds.
    /// Zero waits indefinitely.
    pub drain_timeout_secs: u64,
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Option<std::time::Duration> {
        (self.drain_timeout_secs > 0).then(|| std::time::Duration::from_secs(self.drain_timeout_secs))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}
