//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → quote.rs (request context, spawn pipeline, escalate faults)
//!     → response.rs (Outcome → status + body)
//!     → Send to client
//! ```

pub mod quote;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
