//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use company_service::company::MemoryRepository;
use company_service::config::AppConfig;
use company_service::lifecycle::{build_endpoints, RunError, RunGroup};
use company_service::net::Listener;
use company_service::{HttpServer, RpcServer};

/// Both bindings running in one run group over a shared repository.
pub struct TestService {
    pub http_addr: SocketAddr,
    pub rpc_addr: SocketAddr,
    pub repository: Arc<MemoryRepository>,
    stop: CancellationToken,
    handle: JoinHandle<Result<(), RunError>>,
}

impl TestService {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.http_addr, path)
    }

    /// Stop the group and wait for every actor to return.
    pub async fn stop(self) -> Result<(), RunError> {
        self.stop.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("service did not stop in time")
            .expect("run group task panicked")
    }
}

pub async fn start_service() -> TestService {
    start_service_with(AppConfig::default()).await
}

/// Start the service on ephemeral loopback ports.
pub async fn start_service_with(config: AppConfig) -> TestService {
    let http_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http_addr = http_listener.local_addr().unwrap();
    let rpc_listener = Listener::from_tcp(TcpListener::bind("127.0.0.1:0").await.unwrap(), 64).unwrap();
    let rpc_addr = rpc_listener.local_addr().unwrap();

    let repository = Arc::new(MemoryRepository::new());
    let endpoints = build_endpoints(&config, repository.clone());
    let mut group: RunGroup<RunError> = RunGroup::new();

    let http_token = CancellationToken::new();
    let http_shutdown = http_token.clone();
    let http = HttpServer::new(endpoints.clone(), &config);
    group.add(
        "http",
        async move {
            http.serve(http_listener, http_shutdown).await?;
            Ok::<(), RunError>(())
        },
        move |_| http_token.cancel(),
    );

    let rpc_token = CancellationToken::new();
    let rpc_shutdown = rpc_token.clone();
    let rpc = RpcServer::new(endpoints, config.limits.max_frame_bytes);
    group.add(
        "rpc",
        async move {
            rpc.serve(rpc_listener, rpc_shutdown).await?;
            Ok::<(), RunError>(())
        },
        move |_| rpc_token.cancel(),
    );

    let stop = CancellationToken::new();
    let stopped = stop.clone();
    group.add(
        "test-control",
        async move {
            stopped.cancelled().await;
            Ok(())
        },
        |_| {},
    );

    let handle = tokio::spawn(group.run());

    TestService {
        http_addr,
        rpc_addr,
        repository,
        stop,
        handle,
    }
}
