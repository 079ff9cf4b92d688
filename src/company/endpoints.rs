//! Endpoints: one typed, boxed `tower::Service` per capability.
//!
//! The request type of each endpoint is a type parameter, so a binding can
//! only hand an endpoint the request shape it was built for.

use std::sync::Arc;

use tower::util::BoxCloneSyncService;
use tower::{service_fn, BoxError, ServiceBuilder, ServiceExt};

use crate::company::endpoint_middleware::{EndpointLoggingLayer, EndpointMetricsLayer};
use crate::company::model::{
    Company, DeleteCompanyRequest, Empty, FindAllCompaniesRequest, FindAllCompaniesResponse,
    FindCompanyRequest, Method, SaveCompanyRequest,
};
use crate::company::service::CompanyService;

/// A protocol-agnostic request/response operation.
pub type Endpoint<Req, Resp> = BoxCloneSyncService<Req, Resp, BoxError>;

/// The endpoints of the company service, built once and shared by every
/// transport.
#[derive(Clone)]
pub struct EndpointSet {
    pub save_endpoint: Endpoint<SaveCompanyRequest, Company>,
    pub find_endpoint: Endpoint<FindCompanyRequest, Company>,
    pub delete_endpoint: Endpoint<DeleteCompanyRequest, Empty>,
    pub find_all_endpoint: Endpoint<FindAllCompaniesRequest, FindAllCompaniesResponse>,
}

impl EndpointSet {
    /// Build every endpoint over `service` and wrap it with the standard
    /// middleware stack.
    pub fn new(service: Arc<dyn CompanyService>) -> Self {
        Self {
            save_endpoint: decorate(Method::Save, make_save_endpoint(service.clone())),
            find_endpoint: decorate(Method::Find, make_find_endpoint(service.clone())),
            delete_endpoint: decorate(Method::Delete, make_delete_endpoint(service.clone())),
            find_all_endpoint: decorate(Method::FindAll, make_find_all_endpoint(service)),
        }
    }

    pub async fn save(&self, req: SaveCompanyRequest) -> Result<Company, BoxError> {
        self.save_endpoint.clone().oneshot(req).await
    }

    pub async fn find(&self, req: FindCompanyRequest) -> Result<Company, BoxError> {
        self.find_endpoint.clone().oneshot(req).await
    }

    pub async fn delete(&self, req: DeleteCompanyRequest) -> Result<Empty, BoxError> {
        self.delete_endpoint.clone().oneshot(req).await
    }

    pub async fn find_all(
        &self,
        req: FindAllCompaniesRequest,
    ) -> Result<FindAllCompaniesResponse, BoxError> {
        self.find_all_endpoint.clone().oneshot(req).await
    }
}

/// Apply the endpoint middleware; metrics outermost, logging inside it.
pub fn decorate<Req, Resp>(method: Method, endpoint: Endpoint<Req, Resp>) -> Endpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    BoxCloneSyncService::new(
        ServiceBuilder::new()
            .layer(EndpointMetricsLayer::new(method))
            .layer(EndpointLoggingLayer::new(method))
            .service(endpoint),
    )
}

pub fn make_save_endpoint(service: Arc<dyn CompanyService>) -> Endpoint<SaveCompanyRequest, Company> {
    BoxCloneSyncService::new(service_fn(move |req: SaveCompanyRequest| {
        let service = service.clone();
        async move {
            let company = service.save(req.company).await?;
            Ok::<_, BoxError>(company)
        }
    }))
}

pub fn make_find_endpoint(service: Arc<dyn CompanyService>) -> Endpoint<FindCompanyRequest, Company> {
    BoxCloneSyncService::new(service_fn(move |req: FindCompanyRequest| {
        let service = service.clone();
        async move {
            let company = service.find(req.id).await?;
            Ok::<_, BoxError>(company)
        }
    }))
}

pub fn make_delete_endpoint(service: Arc<dyn CompanyService>) -> Endpoint<DeleteCompanyRequest, Empty> {
    BoxCloneSyncService::new(service_fn(move |req: DeleteCompanyRequest| {
        let service = service.clone();
        async move {
            service.delete(req.id).await?;
            Ok::<_, BoxError>(Empty {})
        }
    }))
}

pub fn make_find_all_endpoint(
    service: Arc<dyn CompanyService>,
) -> Endpoint<FindAllCompaniesRequest, FindAllCompaniesResponse> {
    BoxCloneSyncService::new(service_fn(move |_req: FindAllCompaniesRequest| {
        let service = service.clone();
        async move {
            let companies = service.find_all().await?;
            Ok::<_, BoxError>(FindAllCompaniesResponse { companies })
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::error::{CompanyError, ValidationError};
    use crate::company::memory::MemoryRepository;
    use crate::company::service::new_service;
    use crate::config::ValidationConfig;

    fn endpoints() -> EndpointSet {
        let svc = new_service(
            Arc::new(MemoryRepository::new()),
            ValidationConfig::default(),
            &[],
        );
        EndpointSet::new(svc)
    }

    fn company_error(err: BoxError) -> CompanyError {
        err.downcast_ref::<CompanyError>()
            .cloned()
            .expect("endpoint errors are company errors")
    }

    #[tokio::test]
    async fn save_error_passes_through_unchanged() {
        let set = endpoints();
        let err = set
            .save(SaveCompanyRequest {
                company: Company::named(""),
            })
            .await
            .unwrap_err();
        assert_eq!(
            company_error(err),
            CompanyError::Validation(ValidationError::RequiredField("name"))
        );
    }

    #[tokio::test]
    async fn find_surfaces_not_found() {
        let set = endpoints();
        let err = set.find(FindCompanyRequest { id: 12 }).await.unwrap_err();
        assert_eq!(company_error(err), CompanyError::NotFound(12));
    }

    #[tokio::test]
    async fn delete_returns_empty_on_success() {
        let set = endpoints();
        let saved = set
            .save(SaveCompanyRequest {
                company: Company::named("Acme"),
            })
            .await
            .unwrap();

        assert_eq!(set.delete(DeleteCompanyRequest { id: saved.id }).await.unwrap(), Empty {});
        let err = set.delete(DeleteCompanyRequest { id: saved.id }).await.unwrap_err();
        assert_eq!(company_error(err), CompanyError::NotFound(saved.id));
    }

    #[tokio::test]
    async fn find_all_starts_empty() {
        let set = endpoints();
        let all = set.find_all(FindAllCompaniesRequest {}).await.unwrap();
        assert!(all.companies.is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_same_service() {
        let set = endpoints();
        let other = set.clone();

        let saved = set
            .save(SaveCompanyRequest {
                company: Company::named("Acme"),
            })
            .await
            .unwrap();
        assert_eq!(other.find(FindCompanyRequest { id: saved.id }).await.unwrap(), saved);
    }
}
