//! Per-request action resolution.
//!
//! # Responsibilities
//! - Evaluate a handler's dispatch conditions in declaration order
//! - Return the first satisfied dispatch, else the default, else Unresolved
//!
//! # Design Decisions
//! - First match wins; later conditions are not evaluated
//! - Evaluation errors count as "no match" and are logged, never propagated
//! - Explicit Unresolved rather than a silent fallback to some action
//! - No shared mutable state: safe to call from any number of request tasks

use std::sync::Arc;

use serde_json::Value;

use crate::condition::{ConditionEvaluator, RequestContent};
use crate::observability::metrics;
use crate::routing::handler::OptimizedHandler;

/// Outcome of resolving a request against an optimized handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A dispatch condition matched.
    Matched { action_id: &'a str, index: usize },
    /// No condition matched; the handler's default action applies.
    Default(&'a str),
    /// No condition matched and the handler has no default.
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn action_id(&self) -> Option<&'a str> {
        match *self {
            Resolution::Matched { action_id, .. } | Resolution::Default(action_id) => Some(action_id),
            Resolution::Unresolved => None,
        }
    }

    /// Label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Matched { .. } => "matched",
            Resolution::Default(_) => "default",
            Resolution::Unresolved => "unresolved",
        }
    }
}

/// Resolves the target action of a request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    trigger_id: String,
    evaluator: Arc<dyn ConditionEvaluator>,
}

impl Dispatcher {
    pub fn new(trigger_id: impl Into<String>, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &dyn ConditionEvaluator {
        self.evaluator.as_ref()
    }

    /// Resolve `content` (already serialized) against `handler`.
    pub fn resolve<'h>(&self, handler: &'h OptimizedHandler, content: &str) -> Resolution<'h> {
        self.resolve_content(handler, &RequestContent::new(content))
    }

    /// Resolve with a content view shared by every condition of the handler.
    pub fn resolve_content<'h>(
        &self,
        handler: &'h OptimizedHandler,
        content: &RequestContent<'_>,
    ) -> Resolution<'h> {
        for (index, dispatch) in handler.dispatches().iter().enumerate() {
            match self.evaluator.evaluate_content(&dispatch.condition, content) {
                Ok(true) => {
                    tracing::debug!(
                        trigger = %self.trigger_id,
                        action_id = %dispatch.action_id,
                        index,
                        "Dispatch resolved"
                    );
                    return Resolution::Matched {
                        action_id: &dispatch.action_id,
                        index,
                    };
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        trigger = %self.trigger_id,
                        condition = %dispatch.condition,
                        error = %e,
                        "Skipping dispatch whose condition could not be evaluated"
                    );
                    metrics::record_condition_error(&self.trigger_id);
                }
            }
        }

        match handler.default_action_id() {
            Some(action_id) => {
                tracing::debug!(
                    trigger = %self.trigger_id,
                    action_id = %action_id,
                    "Dispatch not resolved, using default action"
                );
                Resolution::Default(action_id)
            }
            None => Resolution::Unresolved,
        }
    }
}

/// Serialize decoded content once per request for condition evaluation.
pub fn serialize_content(content: &Value) -> String {
    // Serializing a Value cannot fail: keys are always strings.
    serde_json::to_string(content).unwrap_or_else(|_| "null".to_string())
}
