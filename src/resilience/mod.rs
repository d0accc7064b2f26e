//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → RequestContext (request ceiling + cancellation)
//!     → run_stage (fetch sub-deadline)
//!     → run_stage (persist sub-deadline)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: one fetch and one write per request

pub mod timeouts;

pub use timeouts::{run_stage, CancelHandle, RequestContext, StageTimeout};
