//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Optimize handlers per trigger → Build routers → Bind all → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Each server drains in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: every trigger is built before any listener is bound
//! - One broadcast stops every trigger server

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{
    bind, build_servers, build_servers_with, routing_table, run, serve_until, StartupError,
};
