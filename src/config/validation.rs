//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (limits > 0, timeouts > 0)
//! - Detect listeners competing for the same address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    let http = check_address(&mut issues, "http.bind_address", &config.http.bind_address);
    let rpc = check_address(&mut issues, "rpc.bind_address", &config.rpc.bind_address);
    if let (Some(http), Some(rpc)) = (http, rpc) {
        if http == rpc && http.port() != 0 {
            issues.push(ConfigIssue {
                field: "rpc.bind_address",
                message: format!("collides with http.bind_address ({})", http),
            });
        }
    }

    if config.http.max_connections == 0 {
        issues.push(ConfigIssue {
            field: "http.max_connections",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.rpc.max_connections == 0 {
        issues.push(ConfigIssue {
            field: "rpc.max_connections",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue {
            field: "timeouts.request_secs",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.limits.max_body_bytes == 0 {
        issues.push(ConfigIssue {
            field: "limits.max_body_bytes",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.limits.max_frame_bytes == 0 {
        issues.push(ConfigIssue {
            field: "limits.max_frame_bytes",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.validation.max_name_len == 0 {
        issues.push(ConfigIssue {
            field: "validation.max_name_len",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.validation.reserved_names.iter().any(|n| n.trim().is_empty()) {
        issues.push(ConfigIssue {
            field: "validation.reserved_names",
            message: "must not contain blank entries".to_string(),
        });
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut issues,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_address(
    issues: &mut Vec<ConfigIssue>,
    field: &'static str,
    value: &str,
) -> Option<SocketAddr> {
    match value.parse::<SocketAddr>() {
        Ok(addr) => Some(addr),
        Err(e) => {
            issues.push(ConfigIssue {
                field,
                message: format!("invalid socket address '{}': {}", value, e),
            });
            None
        }
    }
}
