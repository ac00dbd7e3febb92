//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → one TriggerConfig per trigger server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; handlers are merged once at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ActionConfig, ActionKind, AppConfig, CorsConfig, DefaultPolicy, DispatchConfig,
    EvaluatorKind, HandlerConfig, InvalidHandlerPolicy, ObservabilityConfig, TriggerConfig,
    TriggerSettings,
};
pub use validation::{validate_config, ValidationError};
