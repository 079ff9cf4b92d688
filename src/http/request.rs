//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Decode JSON request bodies into endpoint requests
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Bodies are read as bytes so decode failures use the service's error shape

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::response::Response;
use serde::de::DeserializeOwned;
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::company::ErrorClass;
use crate::http::response::error_response;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Decode a JSON body. An empty body reads as `{}`.
pub fn decode_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };

    serde_json::from_slice(raw).map_err(|e| {
        tracing::debug!(error = %e, "Rejecting malformed request body");
        error_response(ErrorClass::InvalidArgument, &format!("malformed request: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{FindAllCompaniesRequest, FindCompanyRequest};
    use axum::http::StatusCode;

    #[test]
    fn request_ids_are_unique_uuids() {
        let mut make = MakeRequestUuid;
        let req = Request::new(());
        let a = make.make_request_id(&req).unwrap();
        let b = make.make_request_id(&req).unwrap();

        assert_ne!(a.header_value(), b.header_value());
        let text = a.header_value().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(text).is_ok());
    }

    #[test]
    fn empty_body_decodes_as_empty_object() {
        let req: FindAllCompaniesRequest = decode_json(&Bytes::new()).unwrap();
        assert_eq!(req, FindAllCompaniesRequest {});
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let rejected = decode_json::<FindCompanyRequest>(&Bytes::from_static(b"{\"id\":")).unwrap_err();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
