//! Endpoint middleware as tower layers.
//!
//! Both layers observe a call and return the inner response or error
//! untouched.

use std::fmt;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::company::model::Method;

/// Logs the capability name and elapsed time of every call, or the error.
#[derive(Debug, Clone, Copy)]
pub struct EndpointLoggingLayer {
    method: Method,
}

impl EndpointLoggingLayer {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl<S> Layer<S> for EndpointLoggingLayer {
    type Service = EndpointLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EndpointLogging {
            inner,
            method: self.method,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndpointLogging<S> {
    inner: S,
    method: Method,
}

impl<S, Req> Service<Req> for EndpointLogging<S>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let method = self.method;
        let begin = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;
            let took = begin.elapsed();
            match &result {
                Ok(_) => tracing::info!(method = %method, took = ?took, "endpoint call"),
                Err(e) => tracing::warn!(method = %method, transport_error = %e, took = ?took, "endpoint call"),
            }
            result
        })
    }
}

/// Records per-capability request counters and latency histograms.
#[derive(Debug, Clone, Copy)]
pub struct EndpointMetricsLayer {
    method: Method,
}

impl EndpointMetricsLayer {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl<S> Layer<S> for EndpointMetricsLayer {
    type Service = EndpointMetrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EndpointMetrics {
            inner,
            method: self.method,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndpointMetrics<S> {
    inner: S,
    method: Method,
}

impl<S, Req> Service<Req> for EndpointMetrics<S>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let method = self.method;
        let begin = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;
            crate::observability::metrics::record_endpoint_call(
                method,
                result.is_ok(),
                begin.elapsed(),
            );
            result
        })
    }
}
