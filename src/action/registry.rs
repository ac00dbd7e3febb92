//! In-process action registry and built-in actions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::action::{Action, ActionError, ActionReply, ActionRunner, TriggerAttrs};
use crate::config::schema::{ActionConfig, ActionKind};

/// Replies 200 with the action id and the attribute bag.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAction;

#[async_trait]
impl Action for EchoAction {
    async fn invoke(&self, action_id: &str, attrs: TriggerAttrs) -> Result<ActionReply, ActionError> {
        let data = json!({
            "actionId": action_id,
            "attrs": attrs,
        });
        Ok(ActionReply::new(200, Some(data)))
    }
}

/// Replies with a fixed status and body.
#[derive(Debug, Clone)]
pub struct StaticAction {
    status: u16,
    body: Option<Value>,
}

impl StaticAction {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }
}

#[async_trait]
impl Action for StaticAction {
    async fn invoke(&self, _action_id: &str, _attrs: TriggerAttrs) -> Result<ActionReply, ActionError> {
        Ok(ActionReply::new(self.status, self.body.clone()))
    }
}

/// Runner backed by a fixed map of actions, built once at startup.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configured built-in actions.
    pub fn from_config(actions: &[ActionConfig]) -> Self {
        let mut registry = Self::new();
        for action in actions {
            let imp: Arc<dyn Action> = match &action.kind {
                ActionKind::Echo => Arc::new(EchoAction),
                ActionKind::Static { status, body } => Arc::new(StaticAction::new(*status, body.clone())),
            };
            registry.register(action.id.clone(), imp);
        }
        tracing::debug!(actions = registry.len(), "Action registry built");
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, action: Arc<dyn Action>) {
        self.actions.insert(id.into(), action);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[async_trait]
impl ActionRunner for ActionRegistry {
    async fn run(&self, action_id: &str, attrs: TriggerAttrs) -> Result<ActionReply, ActionError> {
        let action = self
            .actions
            .get(action_id)
            .ok_or_else(|| ActionError::NotFound(action_id.to_string()))?;
        action.invoke(action_id, attrs).await
    }
}
