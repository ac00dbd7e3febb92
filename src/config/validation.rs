//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (handlers reference declared actions)
//! - Validate listener settings (settings present, port present and non-zero)
//! - Detect conflicting triggers (duplicate ids, duplicate bind addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Handler method/path problems are NOT errors here; the optimizer decides
//!   whether an unroutable handler is dropped or fatal

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no triggers configured")]
    NoTriggers,

    #[error("trigger #{0} has an empty id")]
    EmptyTriggerId(usize),

    #[error("duplicate trigger id '{0}'")]
    DuplicateTriggerId(String),

    #[error("no settings found for trigger '{0}'")]
    MissingSettings(String),

    #[error("no port found for trigger '{0}' in settings")]
    MissingPort(String),

    #[error("trigger '{0}' has port 0")]
    InvalidPort(String),

    #[error("trigger '{trigger}' binds {address}, already used by another trigger")]
    DuplicateBinding { trigger: String, address: String },

    #[error("duplicate action id '{0}'")]
    DuplicateActionId(String),

    #[error("handler #{index} of trigger '{trigger}' has an empty action id")]
    EmptyActionId { trigger: String, index: usize },

    #[error("handler #{index} of trigger '{trigger}' references unknown action '{action_id}'")]
    UnknownAction {
        trigger: String,
        index: usize,
        action_id: String,
    },
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut action_ids = HashSet::new();
    for action in &config.actions {
        if !action_ids.insert(action.id.as_str()) {
            errors.push(ValidationError::DuplicateActionId(action.id.clone()));
        }
    }

    if config.triggers.is_empty() {
        errors.push(ValidationError::NoTriggers);
    }

    let mut trigger_ids = HashSet::new();
    let mut bindings = HashSet::new();

    for (i, trigger) in config.triggers.iter().enumerate() {
        if trigger.id.trim().is_empty() {
            errors.push(ValidationError::EmptyTriggerId(i));
        } else if !trigger_ids.insert(trigger.id.as_str()) {
            errors.push(ValidationError::DuplicateTriggerId(trigger.id.clone()));
        }

        match &trigger.settings {
            None => errors.push(ValidationError::MissingSettings(trigger.id.clone())),
            Some(settings) => match settings.port {
                None => errors.push(ValidationError::MissingPort(trigger.id.clone())),
                Some(0) => errors.push(ValidationError::InvalidPort(trigger.id.clone())),
                Some(_) => {
                    if let Some(address) = settings.bind_address() {
                        if !bindings.insert(address.clone()) {
                            errors.push(ValidationError::DuplicateBinding {
                                trigger: trigger.id.clone(),
                                address,
                            });
                        }
                    }
                }
            },
        }

        for (index, handler) in trigger.handlers.iter().enumerate() {
            if handler.action_id.trim().is_empty() {
                errors.push(ValidationError::EmptyActionId {
                    trigger: trigger.id.clone(),
                    index,
                });
            } else if !action_ids.is_empty() && !action_ids.contains(handler.action_id.as_str()) {
                // An empty action list means an external runner owns the ids.
                errors.push(ValidationError::UnknownAction {
                    trigger: trigger.id.clone(),
                    index,
                    action_id: handler.action_id.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{
        ActionConfig, ActionKind, HandlerConfig, TriggerConfig, TriggerSettings,
    };

    fn trigger(id: &str, port: Option<u16>) -> TriggerConfig {
        TriggerConfig {
            id: id.to_string(),
            settings: Some(TriggerSettings {
                port,
                ..TriggerSettings::default()
            }),
            dispatch: Default::default(),
            cors: Default::default(),
            handlers: vec![HandlerConfig::new("a", "GET", "/a")],
        }
    }

    #[test]
    fn test_valid_config() {
        let config = AppConfig {
            triggers: vec![trigger("t1", Some(8080)), trigger("t2", Some(8081))],
            ..AppConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_settings_and_port() {
        let mut no_settings = trigger("t1", Some(8080));
        no_settings.settings = None;
        let config = AppConfig {
            triggers: vec![no_settings, trigger("t2", None)],
            ..AppConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingSettings("t1".into()),
                ValidationError::MissingPort("t2".into()),
            ]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut bad_handler = trigger("t1", Some(8080));
        bad_handler.handlers.push(HandlerConfig::new("", "GET", "/b"));
        bad_handler.handlers.push(HandlerConfig::new("ghost", "GET", "/c"));

        let config = AppConfig {
            actions: vec![
                ActionConfig { id: "a".into(), kind: ActionKind::Echo },
                ActionConfig { id: "a".into(), kind: ActionKind::Echo },
            ],
            triggers: vec![bad_handler, trigger("t1", Some(8080))],
            ..AppConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateActionId("a".into())));
        assert!(errors.contains(&ValidationError::DuplicateTriggerId("t1".into())));
        assert!(errors.contains(&ValidationError::DuplicateBinding {
            trigger: "t1".into(),
            address: "0.0.0.0:8080".into(),
        }));
        assert!(errors.contains(&ValidationError::EmptyActionId {
            trigger: "t1".into(),
            index: 1,
        }));
        assert!(errors.contains(&ValidationError::UnknownAction {
            trigger: "t1".into(),
            index: 2,
            action_id: "ghost".into(),
        }));
    }

    #[test]
    fn test_no_triggers() {
        let errors = validate_config(&AppConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoTriggers]);
    }
}
