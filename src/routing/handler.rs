//! Optimized handler records.
//!
//! # Responsibilities
//! - Hold the merged form of one or more declared handlers
//! - Decide whether a merged handler can be registered as a route
//!
//! # Design Decisions
//! - Immutable once the optimizer returns (shared read-only across requests)
//! - Settings keep every transport setting except the condition
//! - Validity is checked separately from merging so that drops can be reported

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{SETTING_METHOD, SETTING_PATH};

/// Methods a handler may register.
pub const VALID_METHODS: [&str; 6] = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// A single content-based dispatch rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub action_id: String,
    pub condition: String,
}

impl Dispatch {
    pub fn new(action_id: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            condition: condition.into(),
        }
    }
}

/// Why a merged handler cannot be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidHandler {
    #[error("missing method")]
    MissingMethod,

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    #[error("missing path")]
    MissingPath,

    #[error("invalid path '{0}' (must start with '/')")]
    InvalidPath(String),
}

/// The merged, registration-ready form of handlers sharing transport settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedHandler {
    pub(crate) settings: BTreeMap<String, Value>,
    pub(crate) default_action_id: Option<String>,
    pub(crate) dispatches: Vec<Dispatch>,
}

impl OptimizedHandler {
    /// Build a handler directly; the optimizer is the usual producer.
    pub fn new(
        settings: BTreeMap<String, Value>,
        default_action_id: Option<String>,
        dispatches: Vec<Dispatch>,
    ) -> Self {
        Self {
            settings,
            default_action_id,
            dispatches,
        }
    }

    pub fn settings(&self) -> &BTreeMap<String, Value> {
        &self.settings
    }

    pub fn default_action_id(&self) -> Option<&str> {
        self.default_action_id.as_deref()
    }

    pub fn dispatches(&self) -> &[Dispatch] {
        &self.dispatches
    }

    /// Raw method setting, if it is a string.
    pub fn method(&self) -> Option<&str> {
        self.settings.get(SETTING_METHOD).and_then(Value::as_str)
    }

    /// Raw path setting, if it is a string.
    pub fn path(&self) -> Option<&str> {
        self.settings.get(SETTING_PATH).and_then(Value::as_str)
    }

    /// Check that the handler has a supported method and an absolute path.
    ///
    /// Returns the upper-cased method and the declared path on success.
    pub fn validate(&self) -> Result<(String, &str), InvalidHandler> {
        let method = match self.method().map(str::trim) {
            None | Some("") => return Err(InvalidHandler::MissingMethod),
            Some(m) => m.to_ascii_uppercase(),
        };
        if !VALID_METHODS.contains(&method.as_str()) {
            return Err(InvalidHandler::UnsupportedMethod(method));
        }

        match self.path() {
            None | Some("") => Err(InvalidHandler::MissingPath),
            Some(p) if !p.starts_with('/') => Err(InvalidHandler::InvalidPath(p.to_string())),
            Some(p) => Ok((method, p)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// `METHOD path` label for logs; tolerates invalid handlers.
    pub fn label(&self) -> String {
        format!(
            "{} {}",
            self.method().unwrap_or("<none>"),
            self.path().unwrap_or("<none>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(method: Option<Value>, path: Option<&str>) -> OptimizedHandler {
        let mut settings = BTreeMap::new();
        if let Some(m) = method {
            settings.insert(SETTING_METHOD.to_string(), m);
        }
        if let Some(p) = path {
            settings.insert(SETTING_PATH.to_string(), Value::from(p));
        }
        OptimizedHandler::new(settings, Some("a".into()), Vec::new())
    }

    #[test]
    fn test_valid_methods_case_insensitive() {
        for m in ["get", "Post", "PUT", "patch", "DELETE", "options"] {
            let h = handler(Some(Value::from(m)), Some("/a"));
            assert_eq!(h.validate(), Ok((m.to_ascii_uppercase(), "/a")));
        }
    }

    #[test]
    fn test_missing_or_empty_method() {
        assert_eq!(
            handler(None, Some("/a")).validate(),
            Err(InvalidHandler::MissingMethod)
        );
        assert_eq!(
            handler(Some(Value::from("")), Some("/a")).validate(),
            Err(InvalidHandler::MissingMethod)
        );
        assert_eq!(
            handler(Some(Value::from(7)), Some("/a")).validate(),
            Err(InvalidHandler::MissingMethod)
        );
        assert!(!OptimizedHandler::new(BTreeMap::new(), None, Vec::new()).is_valid());
    }

    #[test]
    fn test_unsupported_method() {
        assert_eq!(
            handler(Some(Value::from("head")), Some("/a")).validate(),
            Err(InvalidHandler::UnsupportedMethod("HEAD".into()))
        );
    }

    #[test]
    fn test_path_checks() {
        assert_eq!(
            handler(Some(Value::from("GET")), None).validate(),
            Err(InvalidHandler::MissingPath)
        );
        assert_eq!(
            handler(Some(Value::from("GET")), Some("a/b")).validate(),
            Err(InvalidHandler::InvalidPath("a/b".into()))
        );
    }

    #[test]
    fn test_label() {
        assert_eq!(handler(Some(Value::from("GET")), Some("/a")).label(), "GET /a");
        assert_eq!(handler(None, None).label(), "<none> <none>");
    }
}
