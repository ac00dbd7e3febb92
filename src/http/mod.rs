//! HTTP trigger subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one route per optimized handler)
//!     → request.rs (request ID, decode body, collect params)
//!     → [routing::Dispatcher picks the action]
//!     → [action::ActionRunner runs it]
//!     → response.rs (reply code/data → HTTP response)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{RegisteredRoute, ServerError, TriggerServer};
