//! Action execution seam.
//!
//! # Data Flow
//! ```text
//! resolved action id + TriggerAttrs
//!     → ActionRunner::run
//!     → registry.rs (look up action by id, invoke)
//!     → ActionReply { code, data } or ActionError
//! ```
//!
//! # Design Decisions
//! - The trigger never owns action lifecycle; it only hands over an id and
//!   the attribute bag
//! - Runner is a trait so embedders can plug their own executor
//! - Built-in actions cover configuration-only deployments and tests

pub mod registry;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use registry::{ActionRegistry, EchoAction, StaticAction};

/// Attribute bag handed to an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAttrs {
    /// Path parameters (kept under both names for compatibility).
    pub params: BTreeMap<String, String>,
    pub path_params: BTreeMap<String, String>,
    /// Query parameters; repeated keys are joined with `,`.
    pub query_params: BTreeMap<String, String>,
    /// Decoded request body (`null` when absent).
    pub content: Value,
}

impl TriggerAttrs {
    pub fn new(
        path_params: BTreeMap<String, String>,
        query_params: BTreeMap<String, String>,
        content: Value,
    ) -> Self {
        Self {
            params: path_params.clone(),
            path_params,
            query_params,
            content,
        }
    }
}

/// Result of running an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReply {
    /// HTTP status to reply with; 0 means "unspecified" (200).
    pub code: u16,
    /// Optional JSON body.
    pub data: Option<Value>,
}

impl ActionReply {
    pub fn new(code: u16, data: Option<Value>) -> Self {
        Self { code, data }
    }
}

/// Errors raised by a runner.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action '{0}' not found")]
    NotFound(String),

    #[error("action '{action_id}' failed: {reason}")]
    Failed { action_id: String, reason: String },
}

/// A single executable action.
#[async_trait]
pub trait Action: Send + Sync {
    async fn invoke(&self, action_id: &str, attrs: TriggerAttrs) -> Result<ActionReply, ActionError>;
}

/// Executes actions by identifier.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, action_id: &str, attrs: TriggerAttrs) -> Result<ActionReply, ActionError>;
}
