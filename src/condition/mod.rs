//! Dispatch condition evaluation.
//!
//! # Data Flow
//! ```text
//! Dispatch { action_id, condition }
//!     + serialized request content
//!     → ConditionEvaluator::evaluate
//!     → Ok(true) / Ok(false) / Err(ConditionError)
//! ```
//!
//! # Design Decisions
//! - The grammar is a pluggable strategy chosen per trigger
//! - A condition matches when the content satisfies it (for substring
//!   containment: when the content CONTAINS the needle)
//! - Evaluators are stateless and shared across request tasks
//! - Errors never panic the caller; the dispatcher treats them as no match

pub mod contains;
pub mod json_path;

use std::cell::OnceCell;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::EvaluatorKind;

pub use contains::ContainsEvaluator;
pub use json_path::JsonPathEvaluator;

/// Errors raised while parsing or evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// Blank expression.
    #[error("empty condition expression")]
    Empty,

    /// Expression does not follow the evaluator's grammar.
    #[error("invalid condition '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    /// Content could not be read as the evaluator requires.
    #[error("cannot read content: {0}")]
    Content(String),
}

impl ConditionError {
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Request content as seen by evaluators during one dispatch.
///
/// Holds the serialized form and parses it into JSON at most once, however
/// many conditions ask for it.
#[derive(Debug)]
pub struct RequestContent<'a> {
    raw: &'a str,
    decoded: Option<&'a Value>,
    parsed: OnceCell<Result<Value, String>>,
}

impl<'a> RequestContent<'a> {
    /// Content known only in serialized form.
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            decoded: None,
            parsed: OnceCell::new(),
        }
    }

    /// Content already decoded by the caller; `raw` must be its serialization.
    pub fn decoded(raw: &'a str, value: &'a Value) -> Self {
        Self {
            raw,
            decoded: Some(value),
            parsed: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    /// The content as JSON, parsed on first use.
    pub fn json(&self) -> Result<&Value, ConditionError> {
        if let Some(value) = self.decoded {
            return Ok(value);
        }
        self.parsed
            .get_or_init(|| serde_json::from_str(self.raw).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| ConditionError::Content(e.clone()))
    }
}

/// Decides whether a condition expression matches request content.
pub trait ConditionEvaluator: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if `content` satisfies `expression`.
    fn evaluate(&self, expression: &str, content: &str) -> Result<bool, ConditionError>;

    /// Same as `evaluate`, reusing content shared across a dispatch.
    fn evaluate_content(
        &self,
        expression: &str,
        content: &RequestContent<'_>,
    ) -> Result<bool, ConditionError> {
        self.evaluate(expression, content.raw())
    }

    /// Parse-only check used for startup diagnostics.
    fn check(&self, expression: &str) -> Result<(), ConditionError>;
}

/// Build the evaluator configured for a trigger.
pub fn evaluator_for(kind: EvaluatorKind) -> Arc<dyn ConditionEvaluator> {
    match kind {
        EvaluatorKind::Contains => Arc::new(ContainsEvaluator),
        EvaluatorKind::JsonPath => Arc::new(JsonPathEvaluator),
    }
}

/// Strip one pair of matching single or double quotes.
pub(crate) fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluator_for_kind() {
        assert_eq!(evaluator_for(EvaluatorKind::Contains).name(), "contains");
        assert_eq!(evaluator_for(EvaluatorKind::JsonPath).name(), "json_path");
    }

    #[test]
    fn test_request_content_parses_once() {
        let content = RequestContent::new(r#"{"a":1}"#);
        let first = content.json().unwrap() as *const Value;
        let second = content.json().unwrap() as *const Value;
        assert_eq!(first, second);
        assert_eq!(content.json().unwrap()["a"], 1);
    }

    #[test]
    fn test_request_content_decoded_and_invalid() {
        let value = serde_json::json!({ "a": 1 });
        let content = RequestContent::decoded(r#"{"a":1}"#, &value);
        assert!(std::ptr::eq(content.json().unwrap(), &value));

        let broken = RequestContent::new("{nope");
        assert!(matches!(broken.json(), Err(ConditionError::Content(_))));
        assert!(matches!(broken.json(), Err(ConditionError::Content(_))));
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'foo'"), "foo");
        assert_eq!(strip_quotes("\"foo\""), "foo");
        assert_eq!(strip_quotes("'foo\""), "'foo\"");
        assert_eq!(strip_quotes("'"), "'");
        assert_eq!(strip_quotes("foo"), "foo");
    }
}
