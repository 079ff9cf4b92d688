//! Service-level decorators.

use std::sync::Arc;

use async_trait::async_trait;

use crate::company::error::CompanyResult;
use crate::company::model::Company;
use crate::company::service::CompanyService;

/// A service transform. Must leave returned values untouched.
pub type ServiceMiddleware =
    Arc<dyn Fn(Arc<dyn CompanyService>) -> Arc<dyn CompanyService> + Send + Sync>;

/// Middleware that logs every call with its id or result count.
pub fn logging_middleware() -> ServiceMiddleware {
    Arc::new(|next: Arc<dyn CompanyService>| -> Arc<dyn CompanyService> {
        Arc::new(LoggingService::new(next))
    })
}

pub struct LoggingService {
    next: Arc<dyn CompanyService>,
}

impl LoggingService {
    pub fn new(next: Arc<dyn CompanyService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl CompanyService for LoggingService {
    async fn save(&self, company: Company) -> CompanyResult<Company> {
        let result = self.next.save(company).await;
        match &result {
            Ok(saved) => tracing::info!(method = "Save", id = saved.id, "service call"),
            Err(e) => tracing::info!(method = "Save", err = %e, "service call"),
        }
        result
    }

    async fn find(&self, id: i64) -> CompanyResult<Company> {
        let result = self.next.find(id).await;
        match &result {
            Ok(_) => tracing::info!(method = "Find", id, "service call"),
            Err(e) => tracing::info!(method = "Find", id, err = %e, "service call"),
        }
        result
    }

    async fn delete(&self, id: i64) -> CompanyResult<()> {
        let result = self.next.delete(id).await;
        match &result {
            Ok(()) => tracing::info!(method = "Delete", id, "service call"),
            Err(e) => tracing::info!(method = "Delete", id, err = %e, "service call"),
        }
        result
    }

    async fn find_all(&self) -> CompanyResult<Vec<Company>> {
        let result = self.next.find_all().await;
        match &result {
            Ok(all) => tracing::info!(method = "FindAll", results_returned = all.len(), "service call"),
            Err(e) => tracing::info!(method = "FindAll", err = %e, "service call"),
        }
        result
    }
}
