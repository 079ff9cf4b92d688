//! Startup orchestration.
//!
//! # Responsibilities
//! - Compose repository, service middleware and endpoints
//! - Register one actor per listener, the signal watcher and the
//!   optional metrics exporter
//! - Translate the run group result into a process exit code
//!
//! # Design Decisions
//! - Listeners bind inside their actor, so a bind failure ends the group
//!   like any other actor failure
//! - Each actor owns a cancellation token; interrupting it cancels the token

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::company::{logging_middleware, new_service, CompanyRepository, EndpointSet, MemoryRepository};
use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::run_group::RunGroup;
use crate::lifecycle::signals::wait_for_signal;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics::install_exporter;
use crate::rpc::RpcServer;

/// Why the run group stopped.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("received signal {0}")]
    Signal(&'static str),

    #[error("failed to install signal handler: {0}")]
    SignalSetup(#[source] std::io::Error),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("metrics exporter failed: {0}")]
    Metrics(String),
}

impl RunError {
    /// Signals end the process in an orderly way.
    pub fn is_orderly(&self) -> bool {
        matches!(self, RunError::Signal(_))
    }
}

/// Map the run group result onto the process exit status.
pub fn exit_status(result: &Result<(), RunError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) if e.is_orderly() => 0,
        Err(_) => 1,
    }
}

/// Build the endpoint set over `repository` with the standard service
/// middleware.
pub fn build_endpoints(config: &AppConfig, repository: Arc<dyn CompanyRepository>) -> EndpointSet {
    let service = new_service(repository, config.validation.clone(), &[logging_middleware()]);
    EndpointSet::new(service)
}

/// Register every actor the configuration asks for.
pub fn build_run_group(config: &AppConfig, endpoints: EndpointSet) -> RunGroup<RunError> {
    let mut group = RunGroup::new().with_drain_timeout(config.shutdown.drain_timeout());

    add_http_actor(&mut group, config, endpoints.clone());
    add_rpc_actor(&mut group, config, endpoints);
    if config.observability.metrics_enabled {
        add_metrics_actor(&mut group, config.observability.metrics_address.clone());
    }
    add_signal_actor(&mut group);

    group
}

/// Run the service with an in-memory repository until the first actor stops.
pub async fn run(config: AppConfig) -> Result<(), RunError> {
    let repository: Arc<dyn CompanyRepository> = Arc::new(MemoryRepository::new());
    let endpoints = build_endpoints(&config, repository);
    let group = build_run_group(&config, endpoints);

    tracing::info!(
        http_address = %config.http.bind_address,
        rpc_address = %config.rpc.bind_address,
        actors = group.len(),
        "Starting company service"
    );

    group.run().await
}

pub fn add_http_actor(group: &mut RunGroup<RunError>, config: &AppConfig, endpoints: EndpointSet) {
    let token = CancellationToken::new();
    let shutdown = token.clone();
    let server = HttpServer::new(endpoints, config);
    let listener_config = config.http.clone();

    group.add(
        "http",
        async move {
            let listener = HttpServer::bind(&listener_config).await?;
            server.serve(listener, shutdown).await?;
            Ok::<(), RunError>(())
        },
        move |_| token.cancel(),
    );
}

pub fn add_rpc_actor(group: &mut RunGroup<RunError>, config: &AppConfig, endpoints: EndpointSet) {
    let token = CancellationToken::new();
    let shutdown = token.clone();
    let server = RpcServer::new(endpoints, config.limits.max_frame_bytes);
    let listener_config = config.rpc.clone();

    group.add(
        "rpc",
        async move {
            let listener = Listener::bind(&listener_config).await?;
            server.serve(listener, shutdown).await?;
            Ok::<(), RunError>(())
        },
        move |_| token.cancel(),
    );
}

pub fn add_metrics_actor(group: &mut RunGroup<RunError>, address: String) {
    let token = CancellationToken::new();
    let shutdown = token.clone();

    group.add(
        "metrics",
        async move {
            let addr: SocketAddr = address
                .parse()
                .map_err(|e| RunError::Metrics(format!("invalid address {}: {}", address, e)))?;
            let exporter = install_exporter(addr).map_err(|e| RunError::Metrics(e.to_string()))?;

            tokio::select! {
                _ = shutdown.cancelled() => Ok(()),
                result = exporter => result.map_err(RunError::Metrics),
            }
        },
        move |_| token.cancel(),
    );
}

pub fn add_signal_actor(group: &mut RunGroup<RunError>) {
    let token = CancellationToken::new();
    group.add("signal", wait_for_signal(token.clone()), move |_| token.cancel());
}
