//! Typed client for the RPC binding.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::company::{
    Company, DeleteCompanyRequest, Empty, FindAllCompaniesRequest, FindAllCompaniesResponse,
    FindCompanyRequest, SaveCompanyRequest,
};
use crate::rpc::protocol::{
    frame_codec, Outcome, RpcCall, RpcReply, RpcRequest, StatusCode, MAX_WIRE_FRAME_BYTES,
};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("operation timed out")]
    Timeout,

    #[error("connection closed by server")]
    Closed,

    #[error("invalid message: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("reply id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: u64 },

    #[error("server error ({code}): {message}")]
    Status { code: StatusCode, message: String },
}

/// A single connection to the RPC listener. Calls are sequential.
pub struct RpcClient {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    next_id: u64,
    timeout: Duration,
}

impl RpcClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, RpcClientError> {
        Self::connect_with_timeout(addr, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
    }

    pub async fn connect_with_timeout(
        addr: impl ToSocketAddrs,
        timeout: Duration,
    ) -> Result<Self, RpcClientError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| RpcClientError::Timeout)??;

        Ok(Self {
            framed: Framed::new(stream, frame_codec(MAX_WIRE_FRAME_BYTES)),
            next_id: 1,
            timeout,
        })
    }

    pub async fn save(&mut self, company: Company) -> Result<Company, RpcClientError> {
        self.call(RpcCall::SaveCompany(SaveCompanyRequest { company }))
            .await
    }

    pub async fn find(&mut self, id: i64) -> Result<Company, RpcClientError> {
        self.call(RpcCall::FindCompany(FindCompanyRequest { id })).await
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RpcClientError> {
        let _: Empty = self
            .call(RpcCall::DeleteCompany(DeleteCompanyRequest { id }))
            .await?;
        Ok(())
    }

    pub async fn find_all(&mut self) -> Result<Vec<Company>, RpcClientError> {
        let all: FindAllCompaniesResponse = self
            .call(RpcCall::FindAllCompanies(FindAllCompaniesRequest {}))
            .await?;
        Ok(all.companies)
    }

    async fn call<T: DeserializeOwned>(&mut self, call: RpcCall) -> Result<T, RpcClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let frame = serde_json::to_vec(&RpcRequest { id, call })?;
        let reply = self.send_raw(Bytes::from(frame)).await?;
        if reply.id != id {
            return Err(RpcClientError::IdMismatch {
                expected: id,
                got: reply.id,
            });
        }

        match reply.outcome {
            Outcome::Result(value) => Ok(serde_json::from_value(value)?),
            Outcome::Error(status) => Err(RpcClientError::Status {
                code: status.code,
                message: status.message,
            }),
        }
    }

    /// Send one frame as-is and read the next reply.
    pub async fn send_raw(&mut self, frame: Bytes) -> Result<RpcReply, RpcClientError> {
        tokio::time::timeout(self.timeout, self.framed.send(frame))
            .await
            .map_err(|_| RpcClientError::Timeout)??;

        let reply = tokio::time::timeout(self.timeout, self.framed.next())
            .await
            .map_err(|_| RpcClientError::Timeout)?
            .ok_or(RpcClientError::Closed)??;

        Ok(serde_json::from_slice(&reply)?)
    }
}
