//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Handler Compilation (at startup):
//!     HandlerConfig[]
//!     → optimizer.rs (merge by non-condition settings)
//!     → handler.rs (validate method/path, drop unroutable)
//!     → Freeze as immutable OptimizedHandler[]
//!
//! Incoming Request (after route match):
//!     serialized content
//!     → dispatcher.rs (evaluate conditions in order)
//!     → Return: Matched / Default / Unresolved
//! ```
//!
//! # Design Decisions
//! - Handlers merged at startup, immutable at runtime
//! - Deterministic: same content always resolves to the same action
//! - First match wins (ordered by declaration)

pub mod dispatcher;
pub mod handler;
pub mod optimizer;

pub use dispatcher::{serialize_content, Dispatcher, Resolution};
pub use handler::{Dispatch, InvalidHandler, OptimizedHandler, VALID_METHODS};
pub use optimizer::{routable, HandlerOptimizer, OptimizeError};
