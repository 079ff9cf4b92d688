//! Company service library: one business capability served over HTTP+JSON
//! and a framed RPC protocol, with coordinated startup and shutdown.

pub mod company;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rpc;

pub use company::{CompanyService, EndpointSet};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{RunError, RunGroup};
pub use rpc::{RpcClient, RpcServer};
