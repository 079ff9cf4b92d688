//! RPC binding subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener, bounded)
//!     → protocol.rs (length-prefixed JSON frames)
//!     → server.rs (decode call → endpoint → classify error → reply)
//!     → client.rs (typed calls for tools and tests)
//! ```
//!
//! # Design Decisions
//! - One frame per message; a connection answers its requests in order
//! - A malformed request gets an error reply, broken framing closes the connection
//! - Errors are classified through the shared `company::classify` table

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{RpcClient, RpcClientError};
pub use protocol::{
    frame_codec, Outcome, RpcCall, RpcReply, RpcRequest, RpcStatus, StatusCode,
    MAX_WIRE_FRAME_BYTES,
};
pub use server::{dispatch, RpcServer};
