//! HTTP+JSON binding subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, routes under /company)
//!     → request.rs (request ID, JSON decode)
//!     → company endpoints
//!     → response.rs (JSON encode, error class → status code)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::status_for;
pub use server::{build_router, HttpServer};
