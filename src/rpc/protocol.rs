//! RPC wire format.
//!
//! Every message is one frame: a 4-byte big-endian length followed by a JSON
//! document.
//!
//! ```text
//! request  {"id": 7, "call": {"method": "FindCompany", "params": {"id": 3}}}
//! success  {"id": 7, "result": {...}}
//! failure  {"id": 7, "error": {"code": "FAILED_PRECONDITION", "message": "..."}}
//! ```

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::codec::LengthDelimitedCodec;

use crate::company::{
    classify, DeleteCompanyRequest, ErrorClass, FindAllCompaniesRequest, FindCompanyRequest,
    Method, SaveCompanyRequest,
};

/// Largest frame the 4-byte length prefix can describe.
pub const MAX_WIRE_FRAME_BYTES: usize = u32::MAX as usize;

/// Length-prefixed framing shared by server and client. `max_frame_bytes`
/// bounds frames in both directions.
pub fn frame_codec(max_frame_bytes: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(max_frame_bytes)
        .new_codec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: u64,
    pub call: RpcCall,
}

/// One variant per RPC method, each carrying the request of its endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RpcCall {
    SaveCompany(SaveCompanyRequest),
    FindCompany(FindCompanyRequest),
    DeleteCompany(DeleteCompanyRequest),
    FindAllCompanies(FindAllCompaniesRequest),
}

impl RpcCall {
    pub fn method(&self) -> Method {
        match self {
            RpcCall::SaveCompany(_) => Method::Save,
            RpcCall::FindCompany(_) => Method::Find,
            RpcCall::DeleteCompany(_) => Method::Delete,
            RpcCall::FindAllCompanies(_) => Method::FindAll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    InvalidArgument,
    FailedPrecondition,
    Internal,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Internal => "INTERNAL",
        }
    }
}

impl From<ErrorClass> for StatusCode {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::InvalidArgument => StatusCode::InvalidArgument,
            ErrorClass::FailedPrecondition => StatusCode::FailedPrecondition,
            ErrorClass::Internal => StatusCode::Internal,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: StatusCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Status for an error returned by an endpoint.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(classify(err).into(), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Result(serde_json::Value),
    Error(RpcStatus),
}

impl RpcReply {
    pub fn error(id: u64, status: RpcStatus) -> Self {
        Self {
            id,
            outcome: Outcome::Error(status),
        }
    }

    /// Serialize the reply into one frame of at most `max_frame_bytes`.
    ///
    /// A reply that cannot be serialized or does not fit is replaced by an
    /// `INTERNAL` error for the same request id.
    pub fn encode(&self, max_frame_bytes: usize) -> Bytes {
        let failure = match serde_json::to_vec(self) {
            Ok(encoded) if encoded.len() <= max_frame_bytes => return Bytes::from(encoded),
            Ok(encoded) => format!(
                "reply of {} bytes exceeds the {} byte frame limit",
                encoded.len(),
                max_frame_bytes
            ),
            Err(e) => format!("failed to encode reply: {}", e),
        };

        tracing::error!(request_id = self.id, error = %failure, "Replacing undeliverable RPC reply");
        let fallback = RpcReply::error(self.id, RpcStatus::new(StatusCode::Internal, failure));
        // Error replies hold only a code and a short message.
        Bytes::from(serde_json::to_vec(&fallback).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{Company, CompanyError};
    use serde_json::json;

    #[test]
    fn request_uses_method_and_params() {
        let req = RpcRequest {
            id: 7,
            call: RpcCall::FindCompany(FindCompanyRequest { id: 3 }),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"id": 7, "call": {"method": "FindCompany", "params": {"id": 3}}})
        );
    }

    #[test]
    fn find_all_takes_empty_params() {
        let req: RpcRequest = serde_json::from_value(
            json!({"id": 1, "call": {"method": "FindAllCompanies", "params": {}}}),
        )
        .unwrap();
        assert_eq!(req.call, RpcCall::FindAllCompanies(FindAllCompaniesRequest {}));
        assert_eq!(req.call.method(), Method::FindAll);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let parsed = serde_json::from_value::<RpcRequest>(
            json!({"id": 1, "call": {"method": "DropTables", "params": {}}}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn replies_carry_result_or_error() {
        let ok = RpcReply {
            id: 2,
            outcome: Outcome::Result(serde_json::to_value(Company::named("Acme")).unwrap()),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"id": 2, "result": {"id": 0, "name": "Acme"}})
        );

        let err = RpcReply::error(3, RpcStatus::from_error(&CompanyError::NotFound(9)));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"id": 3, "error": {"code": "FAILED_PRECONDITION", "message": "company 9 not found"}})
        );
    }

    #[test]
    fn oversized_reply_becomes_internal_error() {
        let big = RpcReply {
            id: 11,
            outcome: Outcome::Result(json!({ "name": "x".repeat(512) })),
        };

        let frame = big.encode(MAX_WIRE_FRAME_BYTES);
        let decoded: RpcReply = serde_json::from_slice(&frame).unwrap();
        assert_eq!(decoded, big);

        let frame = big.encode(128);
        let decoded: RpcReply = serde_json::from_slice(&frame).unwrap();
        assert_eq!(decoded.id, 11);
        match decoded.outcome {
            Outcome::Error(status) => assert_eq!(status.code, StatusCode::Internal),
            other => panic!("expected an error reply, got {other:?}"),
        }
    }

    #[test]
    fn status_codes_follow_error_class() {
        let repo = CompanyError::Repository("down".into());
        assert_eq!(RpcStatus::from_error(&repo).code, StatusCode::Internal);

        let unknown = std::io::Error::other("wat");
        assert_eq!(RpcStatus::from_error(&unknown).code, StatusCode::Internal);

        assert_eq!(StatusCode::from(ErrorClass::InvalidArgument).to_string(), "INVALID_ARGUMENT");
    }
}
