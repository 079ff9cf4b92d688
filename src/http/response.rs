//! Response encoding.
//!
//! # Responsibilities
//! - Serialize endpoint responses as JSON
//! - Map classified errors onto HTTP status codes
//! - Rewrite error responses from middleware layers into the same shape
//!
//! Error bodies are always `{"error": "<message>"}`.

use axum::body::{to_bytes, Body, Bytes, HttpBody};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tower::BoxError;

use crate::company::{classify, ErrorClass};

/// Upper bound on a middleware error body carried into the JSON message.
const MAX_ERROR_TEXT_BYTES: usize = 4096;

pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorClass::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

pub fn error_response(class: ErrorClass, message: &str) -> Response {
    json_error(status_for(class), message)
}

/// Encode an endpoint result.
pub fn encode<T: Serialize>(result: Result<T, BoxError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => error_response(classify(err.as_ref()), &err.to_string()),
    }
}

/// Give non-JSON error responses (timeouts, body limits, unknown routes) the
/// JSON error shape. The original text, or the status reason when there is
/// none, becomes the message.
pub async fn json_error_bodies<B>(response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response.map(Body::new);
    }

    let (mut parts, body) = response.into_parts();
    let text = match to_bytes(Body::new(body), MAX_ERROR_TEXT_BYTES).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let message = if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_lowercase()
    } else {
        text
    };

    parts.headers.remove(CONTENT_TYPE);
    parts.headers.remove(CONTENT_LENGTH);
    let mut rebuilt = json_error(status, &message);
    rebuilt.headers_mut().extend(parts.headers);
    rebuilt
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{CompanyError, Empty, ValidationError};

    #[test]
    fn each_class_has_a_status() {
        assert_eq!(status_for(ErrorClass::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorClass::FailedPrecondition), StatusCode::PRECONDITION_FAILED);
        assert_eq!(status_for(ErrorClass::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn encode_maps_domain_errors() {
        let cases: Vec<(BoxError, StatusCode)> = vec![
            (ValidationError::RequiredField("name").into(), StatusCode::PRECONDITION_FAILED),
            (CompanyError::NotFound(4).into(), StatusCode::PRECONDITION_FAILED),
            (CompanyError::Repository("down".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (std::io::Error::other("wat").into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(encode::<Empty>(Err(err)).status(), status);
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_error_bodies_get_the_status_reason() {
        let timeout = Response::builder()
            .status(StatusCode::REQUEST_TIMEOUT)
            .body(Body::empty())
            .unwrap();

        let rewritten = json_error_bodies(timeout).await;
        assert_eq!(rewritten.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(rewritten.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_json(rewritten).await, serde_json::json!({ "error": "request timeout" }));
    }

    #[tokio::test]
    async fn plain_text_errors_keep_their_message() {
        let too_large = Response::builder()
            .status(StatusCode::PAYLOAD_TOO_LARGE)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header("x-request-id", "abc")
            .body(Body::from("length limit exceeded"))
            .unwrap();

        let rewritten = json_error_bodies(too_large).await;
        assert_eq!(rewritten.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(rewritten.headers()["x-request-id"], "abc");
        assert_eq!(
            body_json(rewritten).await,
            serde_json::json!({ "error": "length limit exceeded" })
        );
    }

    #[tokio::test]
    async fn json_and_success_responses_pass_through() {
        let domain = error_response(ErrorClass::FailedPrecondition, "company 1 not found");
        let rewritten = json_error_bodies(domain).await;
        assert_eq!(
            body_json(rewritten).await,
            serde_json::json!({ "error": "company 1 not found" })
        );

        let ok = json_error_bodies(encode(Ok::<_, BoxError>(Empty {}))).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await, serde_json::json!({}));
    }

    #[test]
    fn encode_success_is_ok() {
        assert_eq!(encode(Ok::<_, BoxError>(Empty {})).status(), StatusCode::OK);
    }
}
