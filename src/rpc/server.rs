//! RPC server: accepts framed connections and dispatches calls to the
//! endpoint set.
//!
//! # Responsibilities
//! - Accept connections through the bounded listener
//! - Decode request frames and map each call to its endpoint
//! - Encode results or classified errors as reply frames
//! - Stop accepting on shutdown and drain open connections

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tower::BoxError;

use crate::company::EndpointSet;
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::rpc::protocol::{
    frame_codec, Outcome, RpcCall, RpcReply, RpcRequest, RpcStatus, StatusCode,
    MAX_WIRE_FRAME_BYTES,
};

/// Pause before accepting again when the process is out of descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// RPC binding of the company endpoints.
pub struct RpcServer {
    endpoints: EndpointSet,
    max_frame_bytes: usize,
    tracker: ConnectionTracker,
}

impl RpcServer {
    pub fn new(endpoints: EndpointSet, max_frame_bytes: usize) -> Self {
        Self {
            endpoints,
            max_frame_bytes,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Serve connections until `shutdown` is cancelled, then wait for the
    /// open connections to finish their current request and close.
    pub async fn serve(
        self,
        listener: Listener,
        shutdown: CancellationToken,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "RPC server starting");
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) if e.is_per_connection() => {
                            tracing::debug!(error = %e, "Accept failed for one connection");
                            continue;
                        }
                        Err(e) if e.is_resource_exhaustion() => {
                            tracing::warn!(error = %e, backoff = ?ACCEPT_BACKOFF, "Accept failed, backing off");
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(ACCEPT_BACKOFF) => continue,
                            }
                        }
                        Err(e) => return Err(e),
                    };
                    let connection = Connection {
                        endpoints: self.endpoints.clone(),
                        max_frame_bytes: self.max_frame_bytes,
                        shutdown: shutdown.clone(),
                        guard: self.tracker.track(),
                        _permit: permit,
                    };
                    tokio::spawn(connection.run(stream, peer));
                }
            }
        }

        drop(listener);
        tracing::info!(
            open_connections = self.tracker.active_count(),
            "RPC server draining connections"
        );
        self.tracker.wait_idle().await;
        tracing::info!("RPC server stopped");
        Ok(())
    }
}

struct Connection {
    endpoints: EndpointSet,
    max_frame_bytes: usize,
    shutdown: CancellationToken,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
}

impl Connection {
    async fn run(self, stream: TcpStream, peer: SocketAddr) {
        let connection_id = self.guard.id();
        tracing::debug!(connection_id = %connection_id, peer_addr = %peer, "RPC connection opened");

        // Requests are bounded by the configured frame limit; replies only by
        // what the length prefix can carry.
        let (read_half, write_half) = stream.into_split();
        let mut requests = FramedRead::new(read_half, frame_codec(self.max_frame_bytes));
        let mut replies = FramedWrite::new(write_half, frame_codec(MAX_WIRE_FRAME_BYTES));
        loop {
            let frame = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                frame = requests.next() => frame,
            };

            let frame = match frame {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Unreadable frame, closing connection");
                    break;
                }
                None => break,
            };

            let reply = dispatch(&self.endpoints, &frame).await;
            if let Err(e) = replies.send(reply.encode(MAX_WIRE_FRAME_BYTES)).await {
                tracing::debug!(connection_id = %connection_id, error = %e, "Failed to write reply");
                break;
            }
        }

        tracing::debug!(connection_id = %connection_id, "RPC connection closed");
    }
}

/// Decode one request frame, call the matching endpoint and build the reply.
///
/// Frames that are not valid requests get an `INVALID_ARGUMENT` reply. The
/// request id is echoed when it can be read, otherwise it is 0.
pub async fn dispatch(endpoints: &EndpointSet, frame: &[u8]) -> RpcReply {
    let value: serde_json::Value = match serde_json::from_slice(frame) {
        Ok(value) => value,
        Err(e) => return invalid_argument(0, e),
    };
    let id = value.get("id").and_then(serde_json::Value::as_u64).unwrap_or(0);

    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => return invalid_argument(id, e),
    };

    tracing::debug!(request_id = request.id, method = %request.call.method(), "RPC call");

    let outcome = match request.call {
        RpcCall::SaveCompany(req) => outcome(endpoints.save(req).await),
        RpcCall::FindCompany(req) => outcome(endpoints.find(req).await),
        RpcCall::DeleteCompany(req) => outcome(endpoints.delete(req).await),
        RpcCall::FindAllCompanies(req) => outcome(endpoints.find_all(req).await),
    };

    RpcReply {
        id: request.id,
        outcome,
    }
}

fn outcome<T: Serialize>(result: Result<T, BoxError>) -> Outcome {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(value) => Outcome::Result(value),
            Err(e) => Outcome::Error(RpcStatus::new(StatusCode::Internal, e.to_string())),
        },
        Err(err) => Outcome::Error(RpcStatus::from_error(err.as_ref())),
    }
}

fn invalid_argument(id: u64, err: serde_json::Error) -> RpcReply {
    tracing::debug!(request_id = id, error = %err, "Malformed RPC request");
    RpcReply::error(
        id,
        RpcStatus::new(StatusCode::InvalidArgument, format!("malformed request: {}", err)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::company::{new_service, MemoryRepository};
    use crate::config::ValidationConfig;

    fn endpoints() -> EndpointSet {
        EndpointSet::new(new_service(
            Arc::new(MemoryRepository::new()),
            ValidationConfig::default(),
            &[],
        ))
    }

    async fn call(set: &EndpointSet, frame: serde_json::Value) -> serde_json::Value {
        let reply = dispatch(set, frame.to_string().as_bytes()).await;
        serde_json::to_value(reply).unwrap()
    }

    #[tokio::test]
    async fn save_then_find_by_id() {
        let set = endpoints();
        let saved = call(
            &set,
            json!({"id": 1, "call": {"method": "SaveCompany", "params": {"company": {"name": "Acme"}}}}),
        )
        .await;
        assert_eq!(saved["id"], 1);
        let company_id = saved["result"]["id"].as_i64().unwrap();

        let found = call(
            &set,
            json!({"id": 2, "call": {"method": "FindCompany", "params": {"id": company_id}}}),
        )
        .await;
        assert_eq!(found["id"], 2);
        assert_eq!(found["result"]["name"], "Acme");
    }

    #[tokio::test]
    async fn validation_failure_is_failed_precondition() {
        let set = endpoints();
        let reply = call(
            &set,
            json!({"id": 4, "call": {"method": "SaveCompany", "params": {"company": {"name": "duck"}}}}),
        )
        .await;
        assert_eq!(reply["id"], 4);
        assert_eq!(reply["error"]["code"], "FAILED_PRECONDITION");
    }

    #[tokio::test]
    async fn delete_replies_with_empty_result() {
        let set = endpoints();
        let reply = call(
            &set,
            json!({"id": 5, "call": {"method": "DeleteCompany", "params": {"id": 77}}}),
        )
        .await;
        assert_eq!(reply["error"]["code"], "FAILED_PRECONDITION");

        call(
            &set,
            json!({"id": 6, "call": {"method": "SaveCompany", "params": {"company": {"name": "Acme"}}}}),
        )
        .await;
        let all = call(
            &set,
            json!({"id": 7, "call": {"method": "FindAllCompanies", "params": {}}}),
        )
        .await;
        let id = all["result"]["companies"][0]["id"].as_i64().unwrap();

        let reply = call(
            &set,
            json!({"id": 8, "call": {"method": "DeleteCompany", "params": {"id": id}}}),
        )
        .await;
        assert_eq!(reply, json!({"id": 8, "result": {}}));
    }

    #[tokio::test]
    async fn garbage_frame_is_invalid_argument_with_zero_id() {
        let reply = dispatch(&endpoints(), b"{not json").await;
        assert_eq!(reply.id, 0);
        assert!(matches!(
            reply.outcome,
            Outcome::Error(RpcStatus { code: StatusCode::InvalidArgument, .. })
        ));
    }

    #[tokio::test]
    async fn unknown_method_keeps_request_id() {
        let reply = call(
            &endpoints(),
            json!({"id": 12, "call": {"method": "Explode", "params": {}}}),
        )
        .await;
        assert_eq!(reply["id"], 12);
        assert_eq!(reply["error"]["code"], "INVALID_ARGUMENT");
    }
}
