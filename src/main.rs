//! Company service
//!
//! Serves one business capability, company records, over two wire
//! protocols at once.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────── RunGroup ─────────────────────────┐
//!                 │                                                             │
//!   HTTP+JSON ───▶│  http actor ──┐                                             │
//!                 │               ├──▶ EndpointSet ──▶ CompanyService ──▶ repo  │
//!   RPC frames ──▶│  rpc actor ───┘    (metrics, logging)   (logging)           │
//!                 │                                                             │
//!   SIGINT/TERM ─▶│  signal actor        metrics actor (optional)               │
//!                 └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first actor to return stops every other actor; the process then
//! exits 0 for a signal and 1 for any failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use company_service::config::{load_config, validate_config, AppConfig, ConfigError};
use company_service::lifecycle::{exit_status, run};
use company_service::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "company-service", version, about = "Company service over HTTP+JSON and RPC")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "EM_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address, overrides [http].bind_address
    #[arg(long, env = "EM_HTTP_ADDR")]
    http_addr: Option<String>,

    /// RPC listen address, overrides [rpc].bind_address
    #[arg(long, env = "EM_RPC_ADDR")]
    rpc_addr: Option<String>,

    /// Log level, overrides [observability].log_level
    #[arg(long, env = "EM_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };

        if let Some(addr) = self.http_addr {
            config.http.bind_address = addr;
        }
        if let Some(addr) = self.rpc_addr {
            config.rpc.bind_address = addr;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("company-service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "company-service starting");

    let result = run(config).await;
    match &result {
        Ok(()) => tracing::info!("Shutdown complete"),
        Err(e) if e.is_orderly() => tracing::info!(reason = %e, "Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Company service failed"),
    }

    ExitCode::from(exit_status(&result))
}
