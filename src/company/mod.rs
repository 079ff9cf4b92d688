//! Company business capability.
//!
//! # Data Flow
//! ```text
//! transport binding (http / rpc)
//!     → endpoints.rs (typed Endpoint per capability, EndpointSet)
//!     → endpoint_middleware.rs (metrics → logging layers)
//!     → service_middleware.rs (LoggingService)
//!     → service.rs (validation, error translation)
//!     → repository.rs (CompanyRepository trait, CompanyRecord DTO)
//!     → memory.rs (MemoryRepository)
//! ```
//!
//! # Design Decisions
//! - Endpoints are `tower::Service`s; the request shape is part of the type
//! - Middleware is composed explicitly at construction, in a fixed order
//! - Each layer translates errors into its own vocabulary exactly once:
//!   `StoreError` → `CompanyError` → `ErrorClass` → wire status
//! - Service and endpoint layers hold no per-request state

pub mod endpoint_middleware;
pub mod endpoints;
pub mod error;
pub mod memory;
pub mod model;
pub mod repository;
pub mod service;
pub mod service_middleware;

pub use endpoints::{Endpoint, EndpointSet};
pub use error::{classify, CompanyError, CompanyResult, ErrorClass, ValidationError};
pub use memory::MemoryRepository;
pub use model::{
    Company, DeleteCompanyRequest, Empty, FindAllCompaniesRequest, FindAllCompaniesResponse,
    FindCompanyRequest, Method, SaveCompanyRequest,
};
pub use repository::{CompanyRecord, CompanyRepository, StoreError};
pub use service::{new_service, BasicService, CompanyService};
pub use service_middleware::{logging_middleware, LoggingService, ServiceMiddleware};
