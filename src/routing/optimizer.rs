//! Handler merging.
//!
//! # Responsibilities
//! - Merge declared handlers whose non-condition settings are identical
//! - Preserve declaration order of conditioned handlers as dispatch order
//! - Filter merged handlers down to the routable set
//!
//! # Design Decisions
//! - Runs once at startup, before any listener is bound
//! - Merge key is the full settings map minus `condition` (same keys, same values)
//! - Linear scan over merged handlers; handler counts are small
//! - Dropped handlers are always reported, never silently discarded

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{
    DefaultPolicy, HandlerConfig, InvalidHandlerPolicy, SETTING_CONDITION,
};
use crate::routing::handler::{Dispatch, InvalidHandler, OptimizedHandler};

/// Errors that abort optimization for a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    #[error("handler #{index} has a non-string condition")]
    InvalidCondition { index: usize },

    #[error("handler #{index} ({label}) is a second unconditioned handler; default action '{existing}' already set")]
    DuplicateDefault {
        index: usize,
        label: String,
        existing: String,
    },

    #[error("handler {label} cannot be registered: {reason}")]
    InvalidHandler {
        label: String,
        reason: InvalidHandler,
    },
}

/// Merges handler configurations sharing identical transport settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerOptimizer {
    default_policy: DefaultPolicy,
}

impl HandlerOptimizer {
    pub fn new(default_policy: DefaultPolicy) -> Self {
        Self { default_policy }
    }

    /// Merge `configs` in declaration order.
    pub fn optimize(&self, configs: &[HandlerConfig]) -> Result<Vec<OptimizedHandler>, OptimizeError> {
        let mut handlers: Vec<OptimizedHandler> = Vec::new();

        for (index, config) in configs.iter().enumerate() {
            let condition = condition_of(config, index)?;
            let settings: BTreeMap<String, Value> = config
                .settings
                .iter()
                .filter(|(k, _)| k.as_str() != SETTING_CONDITION)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            match handlers.iter_mut().find(|h| h.settings == settings) {
                Some(existing) => match condition {
                    Some(condition) => {
                        existing
                            .dispatches
                            .push(Dispatch::new(config.action_id.clone(), condition));
                    }
                    None => self.set_default(existing, config, index)?,
                },
                None => {
                    let (default_action_id, dispatches) = match condition {
                        Some(condition) => (
                            None,
                            vec![Dispatch::new(config.action_id.clone(), condition)],
                        ),
                        None => (Some(config.action_id.clone()), Vec::new()),
                    };
                    handlers.push(OptimizedHandler::new(settings, default_action_id, dispatches));
                }
            }
        }

        tracing::debug!(
            declared = configs.len(),
            merged = handlers.len(),
            "Handlers optimized"
        );
        Ok(handlers)
    }

    fn set_default(
        &self,
        handler: &mut OptimizedHandler,
        config: &HandlerConfig,
        index: usize,
    ) -> Result<(), OptimizeError> {
        if let Some(existing) = handler.default_action_id.as_deref() {
            match self.default_policy {
                DefaultPolicy::Reject => {
                    return Err(OptimizeError::DuplicateDefault {
                        index,
                        label: handler.label(),
                        existing: existing.to_string(),
                    });
                }
                DefaultPolicy::LastWins => {
                    tracing::warn!(
                        handler = %handler.label(),
                        previous = %existing,
                        current = %config.action_id,
                        "Default action overwritten by a later unconditioned handler"
                    );
                }
            }
        }
        handler.default_action_id = Some(config.action_id.clone());
        Ok(())
    }
}

/// Keep only handlers that can be registered as routes.
pub fn routable(
    handlers: Vec<OptimizedHandler>,
    policy: InvalidHandlerPolicy,
) -> Result<Vec<OptimizedHandler>, OptimizeError> {
    let mut kept = Vec::with_capacity(handlers.len());
    for handler in handlers {
        let verdict = handler.validate().map(|_| ());
        match verdict {
            Ok(()) => kept.push(handler),
            Err(reason) => match policy {
                InvalidHandlerPolicy::Fail => {
                    return Err(OptimizeError::InvalidHandler {
                        label: handler.label(),
                        reason,
                    });
                }
                InvalidHandlerPolicy::Warn => {
                    tracing::warn!(
                        handler = %handler.label(),
                        reason = %reason,
                        "Dropping handler that cannot be registered"
                    );
                }
            },
        }
    }
    Ok(kept)
}

fn condition_of(config: &HandlerConfig, index: usize) -> Result<Option<String>, OptimizeError> {
    match config.settings.get(SETTING_CONDITION) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(OptimizeError::InvalidCondition { index }),
    }
}
