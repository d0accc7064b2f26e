//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Open store → Build engine → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal, external trigger or fatal error → Stop accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_service, Service, StartupError};
