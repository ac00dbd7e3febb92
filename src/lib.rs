//! HTTP-triggered action router.
//!
//! Declared handlers are merged by transport settings, registered as HTTP
//! routes, and every request is dispatched to the first action whose
//! condition matches the request content, or to the route's default action.

pub mod action;
pub mod condition;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use action::{ActionRegistry, ActionReply, ActionRunner, TriggerAttrs};
pub use config::schema::AppConfig;
pub use http::TriggerServer;
pub use lifecycle::Shutdown;
pub use routing::{Dispatcher, HandlerOptimizer, OptimizedHandler, Resolution};
