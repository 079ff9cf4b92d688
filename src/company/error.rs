//! Company service errors and their transport classification.

use thiserror::Error;

/// Reasons a company fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required {0}")]
    RequiredField(&'static str),

    #[error("invalid company {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("company {field} '{value}' already exists")]
    Duplicate { field: &'static str, value: String },
}

/// Errors returned by the company service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompanyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("company {0} not found")]
    NotFound(i64),

    #[error("unable to query repository: {0}")]
    Repository(String),
}

/// Result type for company operations.
pub type CompanyResult<T> = Result<T, CompanyError>;

/// Transport-neutral error class every binding maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The wire request could not be decoded.
    InvalidArgument,
    /// The caller asked for something the current state does not allow.
    FailedPrecondition,
    /// Anything the caller cannot fix.
    Internal,
}

/// Classify an error surfaced by an endpoint.
///
/// Errors that are not `CompanyError` (timeouts from middleware, future
/// error kinds) fall through to `Internal`.
pub fn classify(err: &(dyn std::error::Error + 'static)) -> ErrorClass {
    if err.is::<ValidationError>() {
        return ErrorClass::FailedPrecondition;
    }
    match err.downcast_ref::<CompanyError>() {
        Some(CompanyError::Validation(_)) => ErrorClass::FailedPrecondition,
        Some(CompanyError::NotFound(_)) => ErrorClass::FailedPrecondition,
        Some(CompanyError::Repository(_)) => ErrorClass::Internal,
        None => ErrorClass::Internal,
    }
}
