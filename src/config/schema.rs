//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved handler setting holding the dispatch condition expression.
pub const SETTING_CONDITION: &str = "condition";
/// Reserved handler setting holding the HTTP method.
pub const SETTING_METHOD: &str = "method";
/// Reserved handler setting holding the route path.
pub const SETTING_PATH: &str = "path";

/// Root configuration for the action router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Actions available to the in-process runner.
    pub actions: Vec<ActionConfig>,

    /// HTTP trigger instances, each bound to its own port.
    pub triggers: Vec<TriggerConfig>,
}

/// One HTTP trigger instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    /// Trigger identifier for logging/metrics.
    pub id: String,

    /// Listener settings. Required; a trigger without settings is rejected.
    #[serde(default)]
    pub settings: Option<TriggerSettings>,

    /// Dispatch behaviour (condition grammar, merge policies).
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// CORS policy applied to every route of this trigger.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Declared handlers, in declaration order.
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

/// Listener settings of a trigger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerSettings {
    /// Port to listen on. Required.
    #[serde(default)]
    pub port: Option<u16>,

    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Request timeout (total time for request/response) in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl TriggerSettings {
    /// Bind address as `host:port`, if a port is configured.
    pub fn bind_address(&self) -> Option<String> {
        self.port.map(|port| format!("{}:{}", self.host, port))
    }
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            port: None,
            host: default_host(),
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024 // 2MB
}

/// A declared handler: transport settings plus the target action.
///
/// `settings` carries the reserved keys `method`, `path` and `condition`;
/// any other key is an opaque transport setting that takes part in merging.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HandlerConfig {
    /// Identifier of the action to invoke.
    #[serde(alias = "actionId")]
    pub action_id: String,

    /// Handler settings.
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

impl HandlerConfig {
    /// Convenience constructor used by tests and embedders.
    pub fn new(action_id: impl Into<String>, method: &str, path: &str) -> Self {
        let mut settings = BTreeMap::new();
        settings.insert(SETTING_METHOD.to_string(), Value::from(method));
        settings.insert(SETTING_PATH.to_string(), Value::from(path));
        Self {
            action_id: action_id.into(),
            settings,
        }
    }

    /// Attach a dispatch condition.
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.settings
            .insert(SETTING_CONDITION.to_string(), Value::from(condition));
        self
    }

    /// Attach an arbitrary transport setting.
    pub fn with_setting(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }
}

/// Condition grammar used by a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    /// Substring containment over the serialized content.
    #[default]
    Contains,
    /// JSONPath predicate over the parsed content.
    JsonPath,
}

/// What to do when several unconditioned handlers merge into one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// The last one declared becomes the default; a warning is logged.
    #[default]
    LastWins,
    /// Refuse to start the trigger.
    Reject,
}

/// What to do with a merged handler that cannot be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidHandlerPolicy {
    /// Drop it from registration and log a warning.
    #[default]
    Warn,
    /// Refuse to start the trigger.
    Fail,
}

/// Dispatch behaviour of a trigger.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    pub evaluator: EvaluatorKind,
    pub duplicate_default: DefaultPolicy,
    pub invalid_handler: InvalidHandlerPolicy,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any.
    pub allow_origins: Vec<String>,

    /// Allowed methods for actual requests.
    pub allow_methods: Vec<String>,

    /// Allowed request headers.
    pub allow_headers: Vec<String>,

    /// Headers exposed to the browser.
    pub expose_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: ["POST", "GET", "OPTIONS", "PUT", "DELETE", "PATCH"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_headers: [
                "Origin",
                "X-Requested-With",
                "Content-Type",
                "Accept",
                "Authorization",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            expose_headers: Vec::new(),
            max_age_secs: 21_600,
        }
    }
}

/// An action known to the in-process runner.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionConfig {
    /// Action identifier referenced by handlers.
    pub id: String,

    #[serde(flatten)]
    pub kind: ActionKind,
}

/// Built-in action implementations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Reply with the trigger attributes as JSON.
    Echo,
    /// Reply with a fixed status and optional JSON body.
    Static {
        #[serde(default = "default_static_status")]
        status: u16,
        #[serde(default)]
        body: Option<Value>,
    },
}

fn default_static_status() -> u16 {
    200
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
