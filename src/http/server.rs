//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the company handlers
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Bind server to listener
//! - Stop gracefully when the shutdown token is cancelled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::company::{
    DeleteCompanyRequest, EndpointSet, FindAllCompaniesRequest, FindCompanyRequest,
    SaveCompanyRequest,
};
use crate::config::{AppConfig, ListenerConfig};
use crate::http::request::{decode_json, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{encode, json_error, json_error_bodies};
use crate::net::ListenerError;

/// HTTP+JSON binding of the company endpoints.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(endpoints: EndpointSet, config: &AppConfig) -> Self {
        Self {
            router: build_router(endpoints, config),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured HTTP address.
    pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
        TcpListener::bind(&config.bind_address)
            .await
            .map_err(|source| ListenerError::Bind {
                address: config.bind_address.clone(),
                source,
            })
    }

    /// Serve until `shutdown` is cancelled; in-flight requests complete first.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Serve)?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(ListenerError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(endpoints: EndpointSet, config: &AppConfig) -> Router {
    let in_flight = Arc::new(Semaphore::new(config.http.max_connections));

    let company = Router::new()
        .route("/save", post(save_company))
        .route("/find", post(find_company))
        .route("/delete", post(delete_company))
        .route("/findall", post(find_all_companies));

    Router::new()
        .nest("/company", company)
        .route("/health", get(health))
        .with_state(endpoints)
        .layer(middleware::from_fn_with_state(in_flight, limit_in_flight))
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::map_response(json_error_bodies))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

async fn save_company(State(endpoints): State<EndpointSet>, body: Bytes) -> Response {
    match decode_json::<SaveCompanyRequest>(&body) {
        Ok(req) => encode(endpoints.save(req).await),
        Err(rejected) => rejected,
    }
}

async fn find_company(State(endpoints): State<EndpointSet>, body: Bytes) -> Response {
    match decode_json::<FindCompanyRequest>(&body) {
        Ok(req) => encode(endpoints.find(req).await),
        Err(rejected) => rejected,
    }
}

async fn delete_company(State(endpoints): State<EndpointSet>, body: Bytes) -> Response {
    match decode_json::<DeleteCompanyRequest>(&body) {
        Ok(req) => encode(endpoints.delete(req).await),
        Err(rejected) => rejected,
    }
}

async fn find_all_companies(State(endpoints): State<EndpointSet>, body: Bytes) -> Response {
    match decode_json::<FindAllCompaniesRequest>(&body) {
        Ok(req) => encode(endpoints.find_all(req).await),
        Err(rejected) => rejected,
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Caps the number of requests being handled at once.
async fn limit_in_flight(
    State(permits): State<Arc<Semaphore>>,
    request: Request,
    next: Next,
) -> Response {
    let Ok(_permit) = permits.acquire_owned().await else {
        return json_error(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down");
    };
    next.run(request).await
}
