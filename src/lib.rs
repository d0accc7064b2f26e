//! Currency quotation service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quoting;
pub mod resilience;
pub mod storage;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
