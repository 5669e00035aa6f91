//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (request ID, access log)
//!     → handlers.rs (operation span, outbound call, request metrics)
//!     → response.rs (trace id body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use response::TraceResponse;
pub use server::{AppState, HttpServer};
